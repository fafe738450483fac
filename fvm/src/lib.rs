#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::too_many_arguments
)]

pub mod bc;
pub mod field;
pub mod geom;
pub mod ops;
pub mod stencil;
#[cfg(test)]
mod test_util;

pub type Float = f64;

/// Number of spatial dimensions.
pub const SPACEDIM: usize = 3;

/// Cell index in index space.
pub type IntVect = [i32; SPACEDIM];

pub use bc::{
    apply_bc_functor, fill_extrapolated, fill_physical_bc, BcFunctor, BcOpCreator, BcPolicy,
    BcPolicySource, ConstDirichlet, ConstDirichletBc, DirichletOp, FieldBcDirichlet, FieldBcIface,
    FieldBcNoOp, MAX_BC_COMPONENTS,
};
pub use field::{BcCategory, BcRec, Field, GhostBc, LinOpBc, PatchArray};
pub use geom::{Geometry, IndexBox, Mesh, Orientation, Side};
pub use ops::{
    divergence, gradient, laplacian, q_criterion, q_criterion_nondim, strain_rate_mag,
    vorticity_mag,
};
pub use stencil::{AxisStencil, Stencil};
