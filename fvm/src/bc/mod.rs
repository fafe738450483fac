//! Boundary operators that populate ghost cells beyond the domain.
//!
//! Two layers. Per field, a [`FieldBcIface`] trait object decides which
//! operator applies and is registered once with
//! [`Field::register_custom_bc`]. Per cell, a statically composed
//! [`BcFunctor`] (usually a [`DirichletOp`] over an inflow and a wall
//! [`BcPolicy`]) computes values. Functors are `Copy`, capture everything
//! they need by value and are shared read-only by all workers.

mod dirichlet;
mod fill;

pub use dirichlet::{
    BcOpCreator, ConstDirichlet, ConstDirichletBc, DirichletOp, FieldBcDirichlet,
    MAX_BC_COMPONENTS,
};
pub use fill::{apply_bc_functor, fill_extrapolated, fill_physical_bc};

use crate::{
    field::{BcRec, Field, PatchArray},
    geom::{Geometry, Orientation},
    Float, IntVect,
};

/// Computes the boundary value of one component at one ghost cell.
pub trait BcPolicy: Copy + Send + Sync {
    /// Writes `arr[(iv, dcomp + comp)]` for the face `ori`. `orig_comp + comp`
    /// is the component in the field's own numbering, used to look up
    /// per-component data.
    fn apply(
        &self,
        iv: IntVect,
        arr: &mut PatchArray,
        geom: &Geometry,
        time: Float,
        ori: Orientation,
        comp: usize,
        dcomp: usize,
        orig_comp: usize,
    );
}

/// Host-side description of a policy, turned into a fresh [`BcPolicy`]
/// instance for every fill.
pub trait BcPolicySource {
    type Instance: BcPolicy;

    fn instance(&self, field: &Field) -> Self::Instance;
}

/// Cell-level boundary functor.
pub trait BcFunctor: Copy + Send + Sync {
    /// Fills components `dcomp..dcomp + numcomp` of the ghost cell `iv`.
    /// `bcr[bcomp + n]` is the ghost-fill record of component `n`.
    fn fill(
        &self,
        iv: IntVect,
        arr: &mut PatchArray,
        dcomp: usize,
        numcomp: usize,
        geom: &Geometry,
        time: Float,
        bcr: &[BcRec],
        bcomp: usize,
        orig_comp: usize,
    );

    /// Sets one boundary value through the inflow policy.
    fn set_inflow(
        &self,
        iv: IntVect,
        arr: &mut PatchArray,
        geom: &Geometry,
        time: Float,
        ori: Orientation,
        comp: usize,
        dcomp: usize,
        orig_comp: usize,
    );
}

/// A boundary operator registered on a field.
pub trait FieldBcIface: Send + Sync {
    fn apply(&self, field: &mut Field, time: Float);
}

/// Leaves ghost cells alone, for faces whose values come from exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldBcNoOp;

impl BcFunctor for FieldBcNoOp {
    fn fill(
        &self,
        _iv: IntVect,
        _arr: &mut PatchArray,
        _dcomp: usize,
        _numcomp: usize,
        _geom: &Geometry,
        _time: Float,
        _bcr: &[BcRec],
        _bcomp: usize,
        _orig_comp: usize,
    ) {
    }

    fn set_inflow(
        &self,
        _iv: IntVect,
        _arr: &mut PatchArray,
        _geom: &Geometry,
        _time: Float,
        _ori: Orientation,
        _comp: usize,
        _dcomp: usize,
        _orig_comp: usize,
    ) {
    }
}

impl BcPolicy for FieldBcNoOp {
    fn apply(
        &self,
        _iv: IntVect,
        _arr: &mut PatchArray,
        _geom: &Geometry,
        _time: Float,
        _ori: Orientation,
        _comp: usize,
        _dcomp: usize,
        _orig_comp: usize,
    ) {
    }
}

impl BcPolicySource for FieldBcNoOp {
    type Instance = Self;

    fn instance(&self, _field: &Field) -> Self {
        *self
    }
}

impl FieldBcIface for FieldBcNoOp {
    fn apply(&self, _field: &mut Field, _time: Float) {}
}
