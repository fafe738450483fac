use crate::{
    field::{Field, PatchArray},
    geom::IndexBox,
    ops::{apply, check_fields, stencil_sum, StencilKernel},
    stencil::Stencil,
    Float, SPACEDIM,
};

pub struct Divergence;

impl Divergence {
    pub fn new(divphi: &Field, phi: &Field) -> Self {
        check_fields(divphi, phi);
        assert_eq!(
            divphi.num_comp(),
            1,
            "Divergence output {} must have a single component",
            divphi.name()
        );
        assert_eq!(
            phi.num_comp(),
            SPACEDIM,
            "Divergence input {} must be a vector field",
            phi.name()
        );
        Self
    }
}

impl StencilKernel for Divergence {
    const NAME: &'static str = "divergence";

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
                    stencil_sum(phi, iv, axis, axis, stencil.first_derivative(axis)) * inv_dx[axis]
                })
                .sum();
        }
    }
}

pub fn divergence(divphi: &mut Field, phi: &Field) {
    let kernel = Divergence::new(divphi, phi);
    apply(&kernel, divphi, phi);
}

/// Returns the divergence as a new field named `<phi>_divergence`.
pub fn divergence_of(phi: &Field) -> Field {
    let mut divphi = phi.like(format!("{}_divergence", phi.name()), 1);
    divergence(&mut divphi, phi);
    divphi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{
        assert_all_close, exact_boundary_fill, sample, sample_fn, two_level_mesh, Quadratic,
    };

    #[test]
    fn test_divergence_quadratic() {
        let mesh = two_level_mesh([false, true, false]);
        let quadratics = [
            Quadratic::random(11),
            Quadratic::random(12),
            Quadratic::random(13),
        ];
        let mut velocity = Field::new("velocity", mesh, SPACEDIM);
        exact_boundary_fill(&mut velocity, &quadratics);

        let divphi = divergence_of(&velocity);
        assert_eq!(divphi.name(), "velocity_divergence");
        assert_all_close(
            &sample(&divphi, 0),
            &sample_fn(&divphi, |x| {
                (0..SPACEDIM)
                    .map(|axis| quadratics[axis].gradient(x)[axis])
                    .sum()
            }),
        )
        .with_abs_tol(1e-9)
        .with_rel_tol(1e-9);
    }

    #[test]
    #[should_panic(expected = "must be a vector field")]
    fn test_divergence_arity() {
        let mesh = two_level_mesh([false; 3]);
        let phi = Field::new("phi", mesh.clone(), 2);
        let mut divphi = Field::new("divphi", mesh, 1);
        divergence(&mut divphi, &phi);
    }
}
