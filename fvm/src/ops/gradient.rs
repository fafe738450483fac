use crate::{
    field::{Field, PatchArray},
    geom::IndexBox,
    ops::{apply, check_fields, stencil_sum, StencilKernel},
    stencil::Stencil,
    Float, SPACEDIM,
};

/// Gradient of every component: output component `comp * SPACEDIM + axis`
/// holds the derivative of input component `comp` along `axis`.
pub struct Gradient {
    num_comp: usize,
}

impl Gradient {
    pub fn new(gradphi: &Field, phi: &Field) -> Self {
        check_fields(gradphi, phi);
        assert_eq!(
            gradphi.num_comp(),
            SPACEDIM * phi.num_comp(),
            "Gradient of {} needs {} components in {}",
            phi.name(),
            SPACEDIM * phi.num_comp(),
            gradphi.name()
        );
        Self {
            num_comp: phi.num_comp(),
        }
    }
}

impl StencilKernel for Gradient {
    const NAME: &'static str = "gradient";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            for comp in 0..self.num_comp {
                for axis in 0..SPACEDIM {
                    out[(iv, comp * SPACEDIM + axis)] =
                        stencil_sum(phi, iv, comp, axis, stencil.first_derivative(axis))
                            * inv_dx[axis];
                }
            }
        }
    }
}

pub fn gradient(gradphi: &mut Field, phi: &Field) {
    let kernel = Gradient::new(gradphi, phi);
    apply(&kernel, gradphi, phi);
}

/// Returns the gradient as a new field named `<phi>_gradient`.
pub fn gradient_of(phi: &Field) -> Field {
    let mut gradphi = phi.like(
        format!("{}_gradient", phi.name()),
        SPACEDIM * phi.num_comp(),
    );
    gradient(&mut gradphi, phi);
    gradphi
}
