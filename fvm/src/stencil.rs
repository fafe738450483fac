//! Finite-difference coefficient tables and the regions of a patch they apply
//! to.
//!
//! Each axis independently uses either the centered interior stencil or a
//! one-sided stencil on the first/last cell of a non-periodic domain. The
//! one-sided variants treat the ghost neighbour as a value located on the
//! domain face, half a cell away, which is how external Dirichlet values are
//! stored. All variants differentiate quadratics exactly.

use itertools::iproduct;
use strum::IntoEnumIterator;

use crate::{
    geom::{Geometry, IndexBox},
    Float, SPACEDIM,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
pub enum AxisStencil {
    Interior,
    OneSidedLow,
    OneSidedHigh,
}

impl AxisStencil {
    /// First-derivative weights of the `(i + 1, i, i - 1)` values, in units of
    /// the inverse cell size.
    pub const fn first_derivative(self) -> [Float; 3] {
        match self {
            Self::Interior => [0.5, 0., -0.5],
            Self::OneSidedLow => [1. / 3., 1., -4. / 3.],
            Self::OneSidedHigh => [4. / 3., -1., -1. / 3.],
        }
    }

    /// Second-derivative weights of the `(i + 1, i, i - 1)` values, in units
    /// of the squared inverse cell size.
    pub const fn second_derivative(self) -> [Float; 3] {
        match self {
            Self::Interior => [1., -2., 1.],
            Self::OneSidedLow => [4. / 3., -4., 8. / 3.],
            Self::OneSidedHigh => [8. / 3., -4., 4. / 3.],
        }
    }

    /// Index range along one axis covered by this variant, given the patch
    /// range `[lo, hi]` and the domain range `[domain_lo, domain_hi]`.
    pub fn range(
        self,
        (lo, hi): (i32, i32),
        (domain_lo, domain_hi): (i32, i32),
        periodic: bool,
    ) -> Option<(i32, i32)> {
        if hi < lo {
            return None;
        }
        match self {
            Self::Interior if periodic => Some((lo, hi)),
            Self::Interior => {
                let lo = if lo <= domain_lo { domain_lo + 1 } else { lo };
                let hi = if hi >= domain_hi { domain_hi - 1 } else { hi };
                if hi < lo {
                    None
                } else {
                    Some((lo, hi))
                }
            }
            Self::OneSidedLow if !periodic && lo == domain_lo => Some((domain_lo, domain_lo)),
            Self::OneSidedHigh if !periodic && hi == domain_hi => Some((domain_hi, domain_hi)),
            Self::OneSidedLow | Self::OneSidedHigh => None,
        }
    }
}

/// Per-axis choice of stencil for one region of a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stencil {
    pub axes: [AxisStencil; SPACEDIM],
}

impl Stencil {
    pub const INTERIOR: Self = Self {
        axes: [AxisStencil::Interior; SPACEDIM],
    };

    pub const fn new(axes: [AxisStencil; SPACEDIM]) -> Self {
        Self { axes }
    }

    /// Every combination of axis stencils, interior first.
    pub fn all() -> impl Iterator<Item = Self> {
        iproduct!(AxisStencil::iter(), AxisStencil::iter(), AxisStencil::iter())
            .map(|(x, y, z)| Self::new([x, y, z]))
    }

    pub const fn first_derivative(self, axis: usize) -> [Float; 3] {
        self.axes[axis].first_derivative()
    }

    pub const fn second_derivative(self, axis: usize) -> [Float; 3] {
        self.axes[axis].second_derivative()
    }

    /// Sub-box of `tile` on which this stencil is evaluated. Empty when the
    /// stencil does not apply to the tile.
    pub fn apply_box(self, tile: &IndexBox, geom: &Geometry) -> IndexBox {
        if tile.is_empty() {
            return IndexBox::empty();
        }
        let domain = geom.domain();
        let mut bx = *tile;
        for (axis, axis_stencil) in self.axes.iter().enumerate() {
            match axis_stencil.range(
                (tile.lo()[axis], tile.hi()[axis]),
                (domain.lo()[axis], domain.hi()[axis]),
                geom.is_periodic(axis),
            ) {
                Some((lo, hi)) => bx = bx.with_range(axis, lo, hi),
                None => return IndexBox::empty(),
            }
        }
        bx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(periodic: [bool; 3]) -> Geometry {
        Geometry::new(IndexBox::new([0, 0, 0], [7, 7, 7]), [0.; 3], [1.; 3])
            .with_periodicity(periodic)
    }

    /// Applies weights to samples of `f` at offsets `(+1, 0, -1)`, where the
    /// `-1` sample sits at `minus_offset` instead of `-1`.
    fn apply_weights(
        weights: [Float; 3],
        f: impl Fn(Float) -> Float,
        plus_offset: Float,
        minus_offset: Float,
    ) -> Float {
        weights[0] * f(plus_offset) + weights[1] * f(0.) + weights[2] * f(minus_offset)
    }

    #[test]
    fn test_weights_exact_for_quadratics() {
        let f = |x: Float| 3. - 2. * x + 0.75 * x * x;
        let df = |x: Float| -2. + 1.5 * x;
        let d2f = 1.5;
        for (stencil, plus, minus) in [
            (AxisStencil::Interior, 1., -1.),
            (AxisStencil::OneSidedLow, 1., -0.5),
            (AxisStencil::OneSidedHigh, 0.5, -1.),
        ] {
            approx::assert_abs_diff_eq!(
                apply_weights(stencil.first_derivative(), f, plus, minus),
                df(0.),
                epsilon = 1e-13
            );
            approx::assert_abs_diff_eq!(
                apply_weights(stencil.second_derivative(), f, plus, minus),
                d2f,
                epsilon = 1e-13
            );
        }
    }

    #[test]
    fn test_weights_annihilate_constants() {
        for stencil in AxisStencil::iter() {
            approx::assert_abs_diff_eq!(
                stencil.first_derivative().iter().sum::<Float>(),
                0.,
                epsilon = 1e-15
            );
            approx::assert_abs_diff_eq!(
                stencil.second_derivative().iter().sum::<Float>(),
                0.,
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn test_regions_partition_patch() {
        let geom = geometry([false, true, false]);
        for tile in [
            IndexBox::new([0, 0, 0], [7, 7, 7]),
            IndexBox::new([0, 2, 3], [3, 5, 7]),
            IndexBox::new([4, 0, 1], [7, 7, 6]),
            IndexBox::new([7, 7, 0], [7, 7, 0]),
        ] {
            let boxes: Vec<_> = Stencil::all()
                .map(|stencil| stencil.apply_box(&tile, &geom))
                .filter(|bx| !bx.is_empty())
                .collect();
            assert_eq!(
                boxes.iter().map(IndexBox::num_cells).sum::<usize>(),
                tile.num_cells()
            );
            for (n, first) in boxes.iter().enumerate() {
                assert!(tile.contains_box(first));
                for second in &boxes[n + 1..] {
                    assert!(first.intersect(second).is_empty());
                }
            }
        }
    }

    #[test]
    fn test_one_sided_boxes() {
        let geom = geometry([false, false, true]);
        let tile = IndexBox::new([0, 4, 0], [3, 7, 7]);
        let low_x = Stencil::new([
            AxisStencil::OneSidedLow,
            AxisStencil::Interior,
            AxisStencil::Interior,
        ]);
        assert_eq!(
            low_x.apply_box(&tile, &geom),
            IndexBox::new([0, 4, 0], [0, 6, 7])
        );
        let high_y = Stencil::new([
            AxisStencil::Interior,
            AxisStencil::OneSidedHigh,
            AxisStencil::Interior,
        ]);
        assert_eq!(
            high_y.apply_box(&tile, &geom),
            IndexBox::new([1, 7, 0], [3, 7, 7])
        );
        let low_z = Stencil::new([
            AxisStencil::Interior,
            AxisStencil::Interior,
            AxisStencil::OneSidedLow,
        ]);
        assert!(low_z.apply_box(&tile, &geom).is_empty());
        assert_eq!(
            Stencil::INTERIOR.apply_box(&tile, &geom),
            IndexBox::new([1, 4, 0], [3, 6, 7])
        );
    }

    #[test]
    fn test_empty_tile() {
        let geom = geometry([false; 3]);
        let tile = IndexBox::new([0, 0, 0], [-1, 7, 7]);
        assert!(Stencil::all().all(|stencil| stencil.apply_box(&tile, &geom).is_empty()));
    }
}
