use crate::{
    field::{Field, PatchArray},
    geom::IndexBox,
    ops::{apply, check_fields, stencil_sum, StencilKernel},
    stencil::Stencil,
    Float, SPACEDIM,
};

/// Scalar Laplacian assembled from a per-axis representation: input component
/// `axis` is differentiated twice along `axis` and the results are summed.
pub struct Laplacian;

impl Laplacian {
    pub fn new(lapphi: &Field, phi: &Field) -> Self {
        check_fields(lapphi, phi);
        assert_eq!(
            lapphi.num_comp(),
            1,
            "Laplacian output {} must have a single component",
            lapphi.name()
        );
        assert_eq!(
            phi.num_comp(),
            SPACEDIM,
            "Laplacian input {} must have one component per axis",
            phi.name()
        );
        Self
    }
}

impl StencilKernel for Laplacian {
    const NAME: &'static str = "laplacian";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            out[(iv, 0)] = (0..SPACEDIM)
                .map(|axis| {
                    stencil_sum(phi, iv, axis, axis, stencil.second_derivative(axis))
                        * inv_dx[axis]
                        * inv_dx[axis]
                })
                .sum();
        }
    }
}

pub fn laplacian(lapphi: &mut Field, phi: &Field) {
    let kernel = Laplacian::new(lapphi, phi);
    apply(&kernel, lapphi, phi);
}

/// Returns the Laplacian as a new field named `<phi>_laplacian`.
pub fn laplacian_of(phi: &Field) -> Field {
    let mut lapphi = phi.like(format!("{}_laplacian", phi.name()), 1);
    laplacian(&mut lapphi, phi);
    lapphi
}
