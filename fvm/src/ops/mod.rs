//! Finite-volume differential operators on every patch of every level.
//!
//! Operators read the valid and ghost cells of an input field and write the
//! valid cells of an output field. Ghost cells of the input must already be
//! filled: by exchange between patches, and by the boundary operators in
//! [`crate::bc`] on domain faces.

mod divergence;
mod gradient;
mod laplacian;
mod magnitude;

pub use divergence::{divergence, divergence_of, Divergence};
pub use gradient::{gradient, gradient_of, Gradient};
pub use laplacian::{laplacian, laplacian_of, Laplacian};
pub use magnitude::{
    q_criterion, q_criterion_nondim, q_criterion_nondim_of, q_criterion_of, strain_rate_mag,
    strain_rate_mag_of, vorticity_mag, vorticity_mag_of, QCriterion, QCriterionNondim,
    StrainRateMag, VorticityMag,
};

use rayon::prelude::*;

use crate::{
    field::{Field, PatchArray},
    geom::IndexBox,
    stencil::Stencil,
    Float, IntVect, SPACEDIM,
};

/// Cell-wise body of a differential operator for one stencil region.
pub trait StencilKernel: Sync {
    const NAME: &'static str;

    fn apply(
        &self,
        stencil: &Stencil,
        bx: &IndexBox,
        inv_dx: &[Float; SPACEDIM],
        out: &mut PatchArray,
        phi: &PatchArray,
    );
}

/// Runs `kernel` over every region of every patch of every level, one worker
/// per patch.
pub fn apply<K: StencilKernel>(kernel: &K, out: &mut Field, phi: &Field) {
    log::debug!(
        "Computing {} of {} into {} on {} levels",
        K::NAME,
        phi.name(),
        out.name(),
        phi.num_levels()
    );
    for lev in 0..phi.num_levels() {
        let geom = *phi.mesh().geometry(lev);
        let inv_dx = geom.inv_cell_size();
        log::trace!(
            "{} on level {lev}: {} patches",
            K::NAME,
            phi.patches(lev).len()
        );
        out.patches_mut(lev)
            .par_iter_mut()
            .zip(phi.patches(lev).par_iter())
            .for_each(|(out_arr, phi_arr)| {
                let tile = out_arr.valid_box();
                for stencil in Stencil::all() {
                    let bx = stencil.apply_box(&tile, &geom);
                    if bx.is_empty() {
                        continue;
                    }
                    kernel.apply(&stencil, &bx, &inv_dx, out_arr, phi_arr);
                }
            });
    }
}

/// Contract shared by every operator: same mesh, and ghost cells on the input
/// for the stencil to read.
fn check_fields(out: &Field, phi: &Field) {
    assert!(
        out.same_mesh(phi),
        "Fields {} and {} live on different meshes",
        out.name(),
        phi.name()
    );
    assert!(
        phi.num_ghost() >= 1,
        "Field {} needs at least one ghost cell",
        phi.name()
    );
}

/// Weighted sum of `phi` at `iv + e_axis`, `iv`, `iv - e_axis`.
#[inline]
fn stencil_sum(
    phi: &PatchArray,
    iv: IntVect,
    comp: usize,
    axis: usize,
    [cp1, c, cm1]: [Float; 3],
) -> Float {
    let mut plus = iv;
    plus[axis] += 1;
    let mut minus = iv;
    minus[axis] -= 1;
    cp1 * phi[(plus, comp)] + c * phi[(iv, comp)] + cm1 * phi[(minus, comp)]
}

/// Velocity gradient tensor `g[i][j] = d u_i / d x_j` at a cell.
#[inline]
fn velocity_gradient(
    stencil: &Stencil,
    phi: &PatchArray,
    iv: IntVect,
    inv_dx: &[Float; SPACEDIM],
) -> [[Float; SPACEDIM]; SPACEDIM] {
    std::array::from_fn(|comp| {
        std::array::from_fn(|axis| {
            stencil_sum(phi, iv, comp, axis, stencil.first_derivative(axis)) * inv_dx[axis]
        })
    })
}
