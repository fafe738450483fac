use std::sync::Arc;

use ndarray as nd;

use crate::{
    bc::{apply_bc_functor, BcPolicy, DirichletOp},
    field::{BcCategory, Field, PatchArray},
    geom::{Geometry, IndexBox, Mesh, Orientation},
    Float, IntVect, SPACEDIM,
};

pub struct AllCloseAssertion<'a, 'b, V, D: nd::Dimension>
where
    V: std::fmt::Display
        + approx::AbsDiffEq<V, Epsilon = Float>
        + approx::RelativeEq<V, Epsilon = Float>,
{
    left: &'a nd::ArrayBase<nd::OwnedRepr<V>, D>,
    right: &'b nd::ArrayBase<nd::OwnedRepr<V>, D>,

    rel_tol: Option<Float>,
    abs_tol: Option<Float>,
}

impl<V, D: nd::Dimension> AllCloseAssertion<'_, '_, V, D>
where
    V: std::fmt::Display
        + approx::AbsDiffEq<V, Epsilon = Float>
        + approx::RelativeEq<V, Epsilon = Float>,
{
    pub fn with_rel_tol(&mut self, rel_tol: Float) -> &mut Self {
        self.rel_tol = Some(rel_tol);
        self
    }

    pub fn with_abs_tol(&mut self, abs_tol: Float) -> &mut Self {
        self.abs_tol = Some(abs_tol);
        self
    }
}

impl<V, D: nd::Dimension> Drop for AllCloseAssertion<'_, '_, V, D>
where
    V: std::fmt::Display
        + approx::AbsDiffEq<V, Epsilon = Float>
        + approx::RelativeEq<V, Epsilon = Float>,
{
    #[track_caller]
    fn drop(&mut self) {
        assert_eq!(
            self.left.shape(),
            self.right.shape(),
            "Compared arrays differ in shape"
        );
        let mut num_failures = 0;
        self.left
            .indexed_iter()
            .zip(self.right.iter())
            .for_each(|((index, left), right)| {
                let mut checker = approx::Relative::default();
                if let Some(rel_tol) = self.rel_tol {
                    checker = checker.max_relative(rel_tol);
                }
                if let Some(abs_tol) = self.abs_tol {
                    checker = checker.epsilon(abs_tol);
                }

                if !checker.eq(left, right) {
                    if num_failures < 20 {
                        eprintln!("At {index:?}, left = {left}, right = {right}");
                    }
                    num_failures += 1;
                }
            });
        assert!(
            num_failures == 0,
            "Didn't match at {num_failures}/{} elements",
            self.left.len()
        );
    }
}

#[track_caller]
pub fn assert_all_close<
    'a,
    'b,
    V: std::fmt::Display
        + approx::AbsDiffEq<V, Epsilon = Float>
        + approx::RelativeEq<V, Epsilon = Float>,
    D: nd::Dimension,
>(
    left: &'a nd::ArrayBase<nd::OwnedRepr<V>, D>,
    right: &'b nd::ArrayBase<nd::OwnedRepr<V>, D>,
) -> AllCloseAssertion<'a, 'b, V, D> {
    AllCloseAssertion {
        left,
        right,
        rel_tol: Some(1e-7),
        abs_tol: Some(0.),
    }
}

/// `c + b . x + x^T A x` with symmetric `A`. Second-order stencils reproduce
/// its derivatives exactly.
#[derive(Clone, Copy, Debug)]
pub struct Quadratic {
    constant: Float,
    linear: [Float; SPACEDIM],
    quadratic: [[Float; SPACEDIM]; SPACEDIM],
}

impl Quadratic {
    pub fn random(seed: u64) -> Self {
        let mut rng = frand::Rand::with_seed(seed);
        let constant = rng.gen_range((-1.)..1.);
        let linear = std::array::from_fn(|_| rng.gen_range((-1.)..1.));
        let mut quadratic = [[0.; SPACEDIM]; SPACEDIM];
        for i in 0..SPACEDIM {
            for j in i..SPACEDIM {
                let a_ij = rng.gen_range((-1.)..1.);
                quadratic[i][j] = a_ij;
                quadratic[j][i] = a_ij;
            }
        }
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    pub const fn linear(linear: [Float; SPACEDIM], constant: Float) -> Self {
        Self {
            constant,
            linear,
            quadratic: [[0.; SPACEDIM]; SPACEDIM],
        }
    }

    pub fn diagonal(diagonal: [Float; SPACEDIM]) -> Self {
        let mut quadratic = [[0.; SPACEDIM]; SPACEDIM];
        for axis in 0..SPACEDIM {
            quadratic[axis][axis] = diagonal[axis];
        }
        Self {
            constant: 0.,
            linear: [0.; SPACEDIM],
            quadratic,
        }
    }

    pub fn value(&self, x: [Float; SPACEDIM]) -> Float {
        let mut value = self.constant;
        for i in 0..SPACEDIM {
            value += self.linear[i] * x[i];
            for j in 0..SPACEDIM {
                value += self.quadratic[i][j] * x[i] * x[j];
            }
        }
        value
    }

    pub fn gradient(&self, x: [Float; SPACEDIM]) -> [Float; SPACEDIM] {
        std::array::from_fn(|i| {
            self.linear[i] + 2. * (0..SPACEDIM).map(|j| self.quadratic[i][j] * x[j]).sum::<Float>()
        })
    }

    pub fn laplacian(&self) -> Float {
        2. * (0..SPACEDIM).map(|i| self.quadratic[i][i]).sum::<Float>()
    }
}

/// Unit cube with 8^3 coarse cells in 4 patches, plus a refined level with
/// one patch away from the boundary and one touching two high faces.
pub fn two_level_mesh(periodic: [bool; SPACEDIM]) -> Arc<Mesh> {
    Arc::new(
        Mesh::new(IndexBox::new([0, 0, 0], [7, 7, 7]), [0.; 3], [1.; 3])
            .with_periodicity(periodic)
            .with_max_grid_size([4, 8, 4])
            .with_level(&[
                IndexBox::new([2, 2, 2], [5, 13, 7]),
                IndexBox::new([8, 2, 8], [15, 9, 15]),
            ]),
    )
}

/// Exact values on domain faces: the polynomial evaluated on the face.
#[derive(Clone, Copy)]
struct ExactFace<'a> {
    quadratics: &'a [Quadratic],
}

impl BcPolicy for ExactFace<'_> {
    fn apply(
        &self,
        iv: IntVect,
        arr: &mut PatchArray,
        geom: &Geometry,
        _time: Float,
        ori: Orientation,
        comp: usize,
        dcomp: usize,
        orig_comp: usize,
    ) {
        let mut x = geom.cell_center(iv);
        x[ori.axis] = geom.face_coordinate(ori);
        arr[(iv, dcomp + comp)] = self.quadratics[orig_comp + comp].value(x);
    }
}

/// Fills `field` with one polynomial per component: cell-center values in
/// valid and interior ghost cells, face values in ghost cells beyond
/// non-periodic domain faces.
pub fn exact_boundary_fill(field: &mut Field, quadratics: &[Quadratic]) {
    assert_eq!(field.num_comp(), quadratics.len());
    field.fill_with(|comp, x| quadratics[comp].value(x));
    let geom = *field.mesh().geometry(0);
    for ori in Orientation::iter() {
        if !geom.is_periodic(ori.axis) {
            field.set_bc_category(ori, BcCategory::NoSlipWall);
        }
    }
    let exact = ExactFace { quadratics };
    let functor = DirichletOp::new(field, exact, exact);
    apply_bc_functor(field, &functor, 0.);
}

fn collect_valid(
    field: &Field,
    value: impl Fn(&Geometry, &PatchArray, IntVect) -> Float,
) -> nd::Array1<Float> {
    let mut values = Vec::new();
    for lev in 0..field.num_levels() {
        let geom = field.mesh().geometry(lev);
        for arr in field.patches(lev) {
            values.extend(arr.valid_box().iter().map(|iv| value(geom, arr, iv)));
        }
    }
    nd::Array1::from_vec(values)
}

/// Valid-cell values of one component, level by level.
pub fn sample(field: &Field, comp: usize) -> nd::Array1<Float> {
    collect_valid(field, |_, arr, iv| arr[(iv, comp)])
}

/// `f` at valid-cell centers, in the same order as [`sample`].
pub fn sample_fn(field: &Field, f: impl Fn([Float; SPACEDIM]) -> Float) -> nd::Array1<Float> {
    collect_valid(field, |geom, _, iv| f(geom.cell_center(iv)))
}
