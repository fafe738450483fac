use crate::{
    bc::{fill::apply_bc_functor, BcFunctor, BcPolicy, BcPolicySource, FieldBcIface},
    field::{BcCategory, BcRec, Field, GhostBc, PatchArray},
    geom::{Geometry, Orientation, Side},
    Float, IntVect,
};

/// Largest component count whose boundary values can be captured by value.
pub const MAX_BC_COMPONENTS: usize = 9;

/// Imposes the field's per-face, per-component boundary values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstDirichlet {
    num_comp: usize,
    bcv: [[Float; MAX_BC_COMPONENTS]; Orientation::COUNT],
}

impl ConstDirichlet {
    pub fn new(field: &Field) -> Self {
        let num_comp = field.num_comp();
        assert!(
            num_comp <= MAX_BC_COMPONENTS,
            "Field {} has {num_comp} components, at most {MAX_BC_COMPONENTS} supported",
            field.name()
        );
        let mut bcv = [[0.; MAX_BC_COMPONENTS]; Orientation::COUNT];
        for ori in Orientation::iter() {
            let values = field.bc_values(ori);
            assert!(
                values.len() >= num_comp,
                "Boundary values of {} on {ori} have {} entries, need {num_comp}",
                field.name(),
                values.len()
            );
            bcv[ori.index()][..num_comp].copy_from_slice(&values[..num_comp]);
        }
        Self { num_comp, bcv }
    }
}

impl BcPolicy for ConstDirichlet {
    #[inline]
    fn apply(
        &self,
        iv: IntVect,
        arr: &mut PatchArray,
        _geom: &Geometry,
        _time: Float,
        ori: Orientation,
        comp: usize,
        dcomp: usize,
        orig_comp: usize,
    ) {
        debug_assert!(orig_comp + comp < self.num_comp);
        arr[(iv, dcomp + comp)] = self.bcv[ori.index()][orig_comp + comp];
    }
}

/// Source of [`ConstDirichlet`] instances, reading the field's current
/// boundary values at every fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConstDirichletBc;

impl BcPolicySource for ConstDirichletBc {
    type Instance = ConstDirichlet;

    fn instance(&self, field: &Field) -> ConstDirichlet {
        ConstDirichlet::new(field)
    }
}

/// Imposes values on external Dirichlet faces, routing mass-inflow faces to
/// the inflow policy and every other face to the wall policy.
#[derive(Clone, Copy, Debug)]
pub struct DirichletOp<I: BcPolicy, W: BcPolicy> {
    bc_type: [BcCategory; Orientation::COUNT],
    inflow_op: I,
    wall_op: W,
}

impl<I: BcPolicy, W: BcPolicy> DirichletOp<I, W> {
    pub fn new(field: &Field, inflow_op: I, wall_op: W) -> Self {
        Self {
            bc_type: *field.bc_categories(),
            inflow_op,
            wall_op,
        }
    }
}

impl<I: BcPolicy, W: BcPolicy> BcFunctor for DirichletOp<I, W> {
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
    ) {
        let domain = geom.domain();
        for n in 0..numcomp {
            let bc = &bcr[bcomp + n];
            // Later orientations overwrite earlier ones on edges and corners.
            for ori in Orientation::iter() {
                if bc.get(ori) != GhostBc::ExtDir {
                    continue;
                }
                let axis = ori.axis;
                let is_boundary = match ori.side {
                    Side::Low => iv[axis] < domain.lo()[axis],
                    Side::High => iv[axis] > domain.hi()[axis],
                };
                if !is_boundary {
                    continue;
                }
                if self.bc_type[ori.index()] == BcCategory::MassInflow {
                    self.inflow_op
                        .apply(iv, arr, geom, time, ori, n, dcomp, orig_comp);
                } else {
                    self.wall_op
                        .apply(iv, arr, geom, time, ori, n, dcomp, orig_comp);
                }
            }
        }
    }

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
    ) {
        self.inflow_op
            .apply(iv, arr, geom, time, ori, comp, dcomp, orig_comp);
    }
}

/// Decides once which inflow and wall policies a field uses, and builds a
/// fresh [`DirichletOp`] from the field's current metadata on every use.
#[derive(Clone, Copy, Debug, Default)]
pub struct BcOpCreator<I: BcPolicySource, W: BcPolicySource> {
    inflow_op: I,
    wall_op: W,
}

impl<I: BcPolicySource, W: BcPolicySource> BcOpCreator<I, W> {
    pub const fn new(inflow_op: I, wall_op: W) -> Self {
        Self { inflow_op, wall_op }
    }

    pub fn create(&self, field: &Field) -> DirichletOp<I::Instance, W::Instance> {
        DirichletOp::new(
            field,
            self.inflow_op.instance(field),
            self.wall_op.instance(field),
        )
    }
}

impl<I, W> FieldBcIface for BcOpCreator<I, W>
where
    I: BcPolicySource + Send + Sync,
    W: BcPolicySource + Send + Sync,
{
    fn apply(&self, field: &mut Field, time: Float) {
        let functor = self.create(field);
        apply_bc_functor(field, &functor, time);
    }
}

/// Constant values on every external Dirichlet face.
pub type FieldBcDirichlet = BcOpCreator<ConstDirichletBc, ConstDirichletBc>;
