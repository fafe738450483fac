//! Scalar magnitudes derived from the velocity gradient tensor.

use crate::{
    field::{Field, PatchArray},
    geom::IndexBox,
    ops::{apply, check_fields, velocity_gradient, StencilKernel},
    stencil::Stencil,
    Float, SPACEDIM,
};

fn check_velocity(out: &Field, velocity: &Field) {
    check_fields(out, velocity);
    assert_eq!(
        out.num_comp(),
        1,
        "Output {} must have a single component",
        out.name()
    );
    assert_eq!(
        velocity.num_comp(),
        SPACEDIM,
        "Input {} must be a vector field",
        velocity.name()
    );
}

/// Magnitude of the curl of a velocity field.
pub struct VorticityMag;

impl VorticityMag {
    pub fn new(vort: &Field, velocity: &Field) -> Self {
        check_velocity(vort, velocity);
        Self
    }
}

impl StencilKernel for VorticityMag {
    const NAME: &'static str = "vorticity magnitude";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            let g = velocity_gradient(stencil, phi, iv, inv_dx);
            let wx = g[2][1] - g[1][2];
            let wy = g[0][2] - g[2][0];
            let wz = g[1][0] - g[0][1];
            out[(iv, 0)] = (wx * wx + wy * wy + wz * wz).sqrt();
        }
    }
}

/// `sqrt(2 S_ij S_ij)` with `S` the symmetric part of the velocity gradient.
pub struct StrainRateMag;

impl StrainRateMag {
    pub fn new(strain_rate: &Field, velocity: &Field) -> Self {
        check_velocity(strain_rate, velocity);
        Self
    }
}

impl StencilKernel for StrainRateMag {
    const NAME: &'static str = "strain rate magnitude";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            let g = velocity_gradient(stencil, phi, iv, inv_dx);
            let mut sum_sq = 0.;
            for i in 0..SPACEDIM {
                for j in 0..SPACEDIM {
                    let s_ij = 0.5 * (g[i][j] + g[j][i]);
                    sum_sq += s_ij * s_ij;
                }
            }
            out[(iv, 0)] = (2. * sum_sq).sqrt();
        }
    }
}

/// Squared norms `(W_ij W_ij, S_ij S_ij)` of the antisymmetric and symmetric
/// parts of a velocity gradient.
fn rotation_strain_norms(g: &[[Float; SPACEDIM]; SPACEDIM]) -> (Float, Float) {
    let mut w2 = 0.;
    let mut s2 = 0.;
    for i in 0..SPACEDIM {
        for j in 0..SPACEDIM {
            let w_ij = 0.5 * (g[i][j] - g[j][i]);
            let s_ij = 0.5 * (g[i][j] + g[j][i]);
            w2 += w_ij * w_ij;
            s2 += s_ij * s_ij;
        }
    }
    (w2, s2)
}

/// `Q = (W_ij W_ij - S_ij S_ij) / 2`, positive where rotation dominates
/// strain.
pub struct QCriterion;

impl QCriterion {
    pub fn new(q: &Field, velocity: &Field) -> Self {
        check_velocity(q, velocity);
        Self
    }
}

impl StencilKernel for QCriterion {
    const NAME: &'static str = "Q-criterion";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            let (w2, s2) = rotation_strain_norms(&velocity_gradient(stencil, phi, iv, inv_dx));
            out[(iv, 0)] = 0.5 * (w2 - s2);
        }
    }
}

/// Q-criterion scaled by the strain rate, `(W_ij W_ij / S_ij S_ij - 1) / 2`.
/// The strain norm is floored at `Float::MIN_POSITIVE`, so pure rotation gives
/// a very large finite value and a fluid at rest gives `-1/2`.
pub struct QCriterionNondim;

impl QCriterionNondim {
    pub fn new(q: &Field, velocity: &Field) -> Self {
        check_velocity(q, velocity);
        Self
    }
}

impl StencilKernel for QCriterionNondim {
    const NAME: &'static str = "nondimensional Q-criterion";

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    ) {
        for iv in bx.iter() {
            let (w2, s2) = rotation_strain_norms(&velocity_gradient(stencil, phi, iv, inv_dx));
            out[(iv, 0)] = 0.5 * (w2 / s2.max(Float::MIN_POSITIVE) - 1.);
        }
    }
}

pub fn vorticity_mag(vort: &mut Field, velocity: &Field) {
    let kernel = VorticityMag::new(vort, velocity);
    apply(&kernel, vort, velocity);
}

/// Returns the vorticity magnitude as a new field named
/// `<velocity>_vorticity_mag`.
pub fn vorticity_mag_of(velocity: &Field) -> Field {
    let mut vort = velocity.like(format!("{}_vorticity_mag", velocity.name()), 1);
    vorticity_mag(&mut vort, velocity);
    vort
}

pub fn strain_rate_mag(strain_rate: &mut Field, velocity: &Field) {
    let kernel = StrainRateMag::new(strain_rate, velocity);
    apply(&kernel, strain_rate, velocity);
}

pub fn strain_rate_mag_of(velocity: &Field) -> Field {
    let mut strain_rate = velocity.like(format!("{}_strain_rate_mag", velocity.name()), 1);
    strain_rate_mag(&mut strain_rate, velocity);
    strain_rate
}

pub fn q_criterion(q: &mut Field, velocity: &Field) {
    let kernel = QCriterion::new(q, velocity);
    apply(&kernel, q, velocity);
}

pub fn q_criterion_of(velocity: &Field) -> Field {
    let mut q = velocity.like(format!("{}_q_criterion", velocity.name()), 1);
    q_criterion(&mut q, velocity);
    q
}

pub fn q_criterion_nondim(q: &mut Field, velocity: &Field) {
    let kernel = QCriterionNondim::new(q, velocity);
    apply(&kernel, q, velocity);
}

pub fn q_criterion_nondim_of(velocity: &Field) -> Field {
    let mut q = velocity.like(format!("{}_q_criterion_nondim", velocity.name()), 1);
    q_criterion_nondim(&mut q, velocity);
    q
}
