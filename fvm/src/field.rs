use std::sync::Arc;

use ndarray as nd;
use rayon::prelude::*;

use crate::{
    bc::FieldBcIface,
    geom::{IndexBox, Mesh, Orientation, Side},
    Float, IntVect, SPACEDIM,
};

/// Physical category of a domain face, declared per field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BcCategory {
    Periodic,
    MassInflow,
    PressureInflow,
    PressureOutflow,
    NoSlipWall,
    SlipWall,
    WallModel,
    FixedGradient,
    ZeroGradient,
    Symmetric,
    Undefined,
}

impl BcCategory {
    /// Default ghost-fill type for a component. `is_normal` marks the
    /// component of a vector field that is normal to the face.
    pub const fn ghost_bc(self, is_normal: bool) -> GhostBc {
        match self {
            Self::Periodic => GhostBc::Interior,
            Self::MassInflow | Self::NoSlipWall | Self::WallModel => GhostBc::ExtDir,
            Self::SlipWall if is_normal => GhostBc::ExtDir,
            Self::Symmetric if is_normal => GhostBc::ReflectOdd,
            Self::SlipWall | Self::Symmetric => GhostBc::ReflectEven,
            Self::PressureInflow | Self::PressureOutflow | Self::ZeroGradient | Self::Undefined => {
                GhostBc::Foextrap
            }
            Self::FixedGradient => GhostBc::HoExtrap,
        }
    }
}

/// Boundary type handed to an implicit diffusion solve on a domain face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LinOpBc {
    Periodic,
    Dirichlet,
    /// Zero normal gradient.
    Neumann,
    /// Normal gradient given by the face values.
    InhomogNeumann,
}

impl BcCategory {
    /// Solver boundary type for a scalar, or for the tangential components of
    /// a vector.
    pub const fn linop_bc(self) -> LinOpBc {
        match self {
            Self::Periodic => LinOpBc::Periodic,
            Self::PressureInflow
            | Self::PressureOutflow
            | Self::ZeroGradient
            | Self::SlipWall
            | Self::WallModel
            | Self::Symmetric => LinOpBc::Neumann,
            Self::FixedGradient => LinOpBc::InhomogNeumann,
            Self::MassInflow | Self::NoSlipWall | Self::Undefined => LinOpBc::Dirichlet,
        }
    }

    /// Solver boundary type for the vector component normal to the face.
    /// Walls without friction still allow no flow through them.
    pub const fn linop_bc_normal(self) -> LinOpBc {
        match self {
            Self::SlipWall | Self::WallModel | Self::Symmetric => LinOpBc::Dirichlet,
            _ => self.linop_bc(),
        }
    }
}

/// How ghost cells beyond a domain face are populated for one component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GhostBc {
    /// Supplied by exchange with neighbouring patches or periodic images.
    Interior,
    /// Imposed explicitly by a boundary operator.
    ExtDir,
    Foextrap,
    HoExtrap,
    ReflectEven,
    ReflectOdd,
}

/// Ghost-fill types of a single component on every face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BcRec {
    lo: [GhostBc; SPACEDIM],
    hi: [GhostBc; SPACEDIM],
}

impl BcRec {
    pub const fn uniform(bc: GhostBc) -> Self {
        Self {
            lo: [bc; SPACEDIM],
            hi: [bc; SPACEDIM],
        }
    }

    pub const fn lo(&self, axis: usize) -> GhostBc {
        self.lo[axis]
    }
    pub const fn hi(&self, axis: usize) -> GhostBc {
        self.hi[axis]
    }

    pub const fn get(&self, ori: Orientation) -> GhostBc {
        match ori.side {
            Side::Low => self.lo[ori.axis],
            Side::High => self.hi[ori.axis],
        }
    }

    pub fn set(&mut self, ori: Orientation, bc: GhostBc) {
        match ori.side {
            Side::Low => self.lo[ori.axis] = bc,
            Side::High => self.hi[ori.axis] = bc,
        }
    }
}

/// Storage of one patch: the valid box surrounded by ghost cells.
///
/// Indexed with absolute cell indices, `arr[(iv, comp)]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchArray {
    valid: IndexBox,
    grown: IndexBox,
    /// Axes:
    ///     0: x index
    ///     1: y index
    ///     2: z index
    ///     3: component
    data: nd::Array4<Float>,
}

impl PatchArray {
    pub fn zeros(valid: IndexBox, num_ghost: usize, num_comp: usize) -> Self {
        let grown = valid.grow(num_ghost as i32);
        let [nx, ny, nz] = grown.shape();
        Self {
            valid,
            grown,
            data: nd::Array4::zeros((nx, ny, nz, num_comp)),
        }
    }

    pub const fn valid_box(&self) -> IndexBox {
        self.valid
    }
    pub const fn grown_box(&self) -> IndexBox {
        self.grown
    }
    pub fn num_comp(&self) -> usize {
        self.data.shape()[3]
    }

    pub fn view(&self) -> nd::ArrayView4<'_, Float> {
        self.data.view()
    }

    pub fn set_val(&mut self, value: Float) {
        self.data.fill(value);
    }

    #[inline]
    fn array_index(&self, iv: IntVect, comp: usize) -> [usize; 4] {
        debug_assert!(
            self.grown.contains(iv),
            "Cell {iv:?} outside of patch storage {:?}",
            self.grown
        );
        let lo = self.grown.lo();
        [
            (iv[0] - lo[0]) as usize,
            (iv[1] - lo[1]) as usize,
            (iv[2] - lo[2]) as usize,
            comp,
        ]
    }
}

impl std::ops::Index<(IntVect, usize)> for PatchArray {
    type Output = Float;

    #[inline]
    fn index(&self, (iv, comp): (IntVect, usize)) -> &Self::Output {
        &self.data[self.array_index(iv, comp)]
    }
}

impl std::ops::IndexMut<(IntVect, usize)> for PatchArray {
    #[inline]
    fn index_mut(&mut self, (iv, comp): (IntVect, usize)) -> &mut Self::Output {
        let index = self.array_index(iv, comp);
        &mut self.data[index]
    }
}

/// A named, multi-component field on every level of a mesh, together with
/// its boundary metadata.
pub struct Field {
    name: String,
    mesh: Arc<Mesh>,
    num_comp: usize,
    num_ghost: usize,

    /// Indexed by level, then patch.
    levels: Vec<Vec<PatchArray>>,

    bc_category: [BcCategory; Orientation::COUNT],
    bc_values: [Vec<Float>; Orientation::COUNT],
    bc_recs: Vec<BcRec>,

    custom_bcs: Vec<Box<dyn FieldBcIface>>,
}

impl Field {
    const DEFAULT_NUM_GHOST: usize = 1;

    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>, num_comp: usize) -> Self {
        assert!(num_comp > 0, "A field needs at least one component");
        let bc_category = std::array::from_fn(|index| {
            if mesh
                .geometry(0)
                .is_periodic(Orientation::from_index(index).axis)
            {
                BcCategory::Periodic
            } else {
                BcCategory::Undefined
            }
        });
        let mut field = Self {
            name: name.into(),
            levels: Self::allocate(&mesh, Self::DEFAULT_NUM_GHOST, num_comp),
            mesh,
            num_comp,
            num_ghost: Self::DEFAULT_NUM_GHOST,
            bc_category,
            bc_values: std::array::from_fn(|_| vec![0.; num_comp]),
            bc_recs: Vec::new(),
            custom_bcs: Vec::new(),
        };
        field.set_default_bc_types();
        field
    }

    /// A new field on the same mesh with the same ghost width. Boundary
    /// metadata is copied when the component counts agree.
    pub fn like(&self, name: impl Into<String>, num_comp: usize) -> Self {
        let mut field = Self::new(name, self.mesh.clone(), num_comp).with_num_ghost(self.num_ghost);
        field.bc_category = self.bc_category;
        if num_comp == self.num_comp {
            field.bc_values = self.bc_values.clone();
            field.bc_recs = self.bc_recs.clone();
        } else {
            field.set_default_bc_types();
        }
        field
    }

    fn allocate(mesh: &Mesh, num_ghost: usize, num_comp: usize) -> Vec<Vec<PatchArray>> {
        (0..mesh.num_levels())
            .map(|lev| {
                mesh.patches(lev)
                    .iter()
                    .map(|&bx| PatchArray::zeros(bx, num_ghost, num_comp))
                    .collect()
            })
            .collect()
    }

    #[must_use]
    pub fn with_num_ghost(mut self, num_ghost: usize) -> Self {
        self.num_ghost = num_ghost;
        self.levels = Self::allocate(&self.mesh, num_ghost, self.num_comp);
        self
    }

    /// Declares the category of a face and resets the ghost-fill types of
    /// that face to the category's defaults.
    #[must_use]
    pub fn with_bc_category(mut self, ori: Orientation, category: BcCategory) -> Self {
        self.set_bc_category(ori, category);
        self
    }

    /// Same as [`Self::with_bc_category`]. Ghost-fill types on other faces,
    /// including overrides from [`Self::with_bc_rec`], are kept.
    pub fn set_bc_category(&mut self, ori: Orientation, category: BcCategory) {
        let periodic = self.mesh.geometry(0).is_periodic(ori.axis);
        assert_eq!(
            periodic,
            category == BcCategory::Periodic,
            "Face {ori} of field {} is {} but was declared {category}",
            self.name,
            if periodic { "periodic" } else { "not periodic" },
        );
        self.bc_category[ori.index()] = category;
        let is_vector = self.num_comp == SPACEDIM;
        for (comp, bc_rec) in self.bc_recs.iter_mut().enumerate() {
            bc_rec.set(ori, category.ghost_bc(is_vector && comp == ori.axis));
        }
    }

    #[must_use]
    pub fn with_bc_values(mut self, ori: Orientation, values: &[Float]) -> Self {
        self.bc_values[ori.index()] = values.to_vec();
        self
    }

    /// Overrides the ghost-fill types of one component.
    #[must_use]
    pub fn with_bc_rec(mut self, comp: usize, bc_rec: BcRec) -> Self {
        self.bc_recs[comp] = bc_rec;
        self
    }

    pub fn set_default_bc_types(&mut self) {
        let is_vector = self.num_comp == SPACEDIM;
        self.bc_recs = (0..self.num_comp)
            .map(|comp| {
                let mut bc_rec = BcRec::uniform(GhostBc::Interior);
                for ori in Orientation::iter() {
                    let is_normal = is_vector && comp == ori.axis;
                    bc_rec.set(ori, self.bc_category[ori.index()].ghost_bc(is_normal));
                }
                bc_rec
            })
            .collect();
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub const fn num_comp(&self) -> usize {
        self.num_comp
    }
    pub const fn num_ghost(&self) -> usize {
        self.num_ghost
    }
    pub const fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn same_mesh(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.mesh, &other.mesh) || *self.mesh == *other.mesh
    }

    pub fn patches(&self, lev: usize) -> &[PatchArray] {
        &self.levels[lev]
    }
    pub fn patches_mut(&mut self, lev: usize) -> &mut [PatchArray] {
        &mut self.levels[lev]
    }

    pub const fn bc_category(&self, ori: Orientation) -> BcCategory {
        self.bc_category[ori.index()]
    }
    pub const fn bc_categories(&self) -> &[BcCategory; Orientation::COUNT] {
        &self.bc_category
    }
    /// Diffusion solver boundary types of a scalar on every face of one
    /// side, indexed by axis.
    pub fn diffuse_scalar_bc(&self, side: Side) -> [LinOpBc; SPACEDIM] {
        std::array::from_fn(|axis| self.bc_category(Orientation::new(axis, side)).linop_bc())
    }

    /// Diffusion solver boundary types of a velocity on every face of one
    /// side, indexed `[component][axis]`.
    pub fn diffuse_tensor_bc(&self, side: Side) -> [[LinOpBc; SPACEDIM]; SPACEDIM] {
        assert_eq!(
            self.num_comp, SPACEDIM,
            "Field {} is not a vector field",
            self.name
        );
        std::array::from_fn(|comp| {
            std::array::from_fn(|axis| {
                let category = self.bc_category(Orientation::new(axis, side));
                if comp == axis {
                    category.linop_bc_normal()
                } else {
                    category.linop_bc()
                }
            })
        })
    }

    pub fn bc_values(&self, ori: Orientation) -> &[Float] {
        &self.bc_values[ori.index()]
    }
    pub fn bc_recs(&self) -> &[BcRec] {
        &self.bc_recs
    }

    pub fn set_val(&mut self, value: Float) {
        for patches in &mut self.levels {
            patches.iter_mut().for_each(|arr| arr.set_val(value));
        }
    }

    /// Fills valid and ghost cells of every patch with `f(comp, cell center)`.
    pub fn fill_with<F: Fn(usize, [Float; SPACEDIM]) -> Float + Sync>(&mut self, f: F) {
        let num_comp = self.num_comp;
        for (lev, patches) in self.levels.iter_mut().enumerate() {
            let geom = *self.mesh.geometry(lev);
            patches.par_iter_mut().for_each(|arr| {
                for iv in arr.grown_box().iter() {
                    let position = geom.cell_center(iv);
                    for comp in 0..num_comp {
                        arr[(iv, comp)] = f(comp, position);
                    }
                }
            });
        }
    }

    /// Registers a boundary operator to run on every call to
    /// [`Field::apply_bc_funcs`].
    pub fn register_custom_bc(&mut self, bc: Box<dyn FieldBcIface>) {
        self.custom_bcs.push(bc);
    }

    pub fn num_custom_bcs(&self) -> usize {
        self.custom_bcs.len()
    }

    /// Runs the registered boundary operators in registration order.
    pub fn apply_bc_funcs(&mut self, time: Float) {
        let custom_bcs = std::mem::take(&mut self.custom_bcs);
        log::debug!(
            "Applying {} custom boundary operators on {}",
            custom_bcs.len(),
            self.name
        );
        for bc in &custom_bcs {
            bc.apply(self, time);
        }
        let registered_during_apply = std::mem::replace(&mut self.custom_bcs, custom_bcs);
        self.custom_bcs.extend(registered_during_apply);
    }
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("num_comp", &self.num_comp)
            .field("num_ghost", &self.num_ghost)
            .field("num_levels", &self.levels.len())
            .field("bc_category", &self.bc_category)
            .finish_non_exhaustive()
    }
}
