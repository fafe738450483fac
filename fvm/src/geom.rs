use itertools::iproduct;
use strum::IntoEnumIterator;

use crate::{Float, IntVect, SPACEDIM};

/// A cell-centered, axis-aligned region of index space with inclusive corners.
///
/// Any axis with `hi < lo` makes the box empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBox {
    lo: IntVect,
    hi: IntVect,
}

impl IndexBox {
    pub const fn new(lo: IntVect, hi: IntVect) -> Self {
        Self { lo, hi }
    }

    pub const fn empty() -> Self {
        Self {
            lo: [0; SPACEDIM],
            hi: [-1; SPACEDIM],
        }
    }

    pub const fn lo(&self) -> IntVect {
        self.lo
    }
    pub const fn hi(&self) -> IntVect {
        self.hi
    }

    pub fn is_empty(&self) -> bool {
        (0..SPACEDIM).any(|axis| self.hi[axis] < self.lo[axis])
    }

    /// Number of cells along `axis`, zero for an empty box.
    pub fn length(&self, axis: usize) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.hi[axis] - self.lo[axis] + 1) as usize
        }
    }

    pub fn shape(&self) -> [usize; SPACEDIM] {
        std::array::from_fn(|axis| self.length(axis))
    }

    pub fn num_cells(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn contains(&self, iv: IntVect) -> bool {
        (0..SPACEDIM).all(|axis| self.lo[axis] <= iv[axis] && iv[axis] <= self.hi[axis])
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        other.is_empty() || (self.contains(other.lo) && self.contains(other.hi))
    }

    #[must_use]
    pub fn grow(self, num_cells: i32) -> Self {
        Self {
            lo: self.lo.map(|lo| lo - num_cells),
            hi: self.hi.map(|hi| hi + num_cells),
        }
    }

    /// Replaces the index range along `axis`.
    #[must_use]
    pub fn with_range(mut self, axis: usize, lo: i32, hi: i32) -> Self {
        self.lo[axis] = lo;
        self.hi[axis] = hi;
        self
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            lo: std::array::from_fn(|axis| self.lo[axis].max(other.lo[axis])),
            hi: std::array::from_fn(|axis| self.hi[axis].min(other.hi[axis])),
        }
    }

    #[must_use]
    pub fn refine(self, ratio: i32) -> Self {
        Self {
            lo: self.lo.map(|lo| lo * ratio),
            hi: self.hi.map(|hi| (hi + 1) * ratio - 1),
        }
    }

    #[must_use]
    pub fn coarsen(self, ratio: i32) -> Self {
        Self {
            lo: self.lo.map(|lo| lo.div_euclid(ratio)),
            hi: self.hi.map(|hi| hi.div_euclid(ratio)),
        }
    }

    /// Splits the box into nearly equal pieces no longer than `max_size` along
    /// each axis.
    pub fn chop(&self, max_size: [usize; SPACEDIM]) -> Vec<Self> {
        if self.is_empty() {
            return Vec::new();
        }
        let ranges: [Vec<(i32, i32)>; SPACEDIM] = std::array::from_fn(|axis| {
            assert!(max_size[axis] > 0, "Maximum patch size must be positive");
            let length = self.length(axis);
            let num_pieces = length.div_ceil(max_size[axis]);
            let base = length / num_pieces;
            let remainder = length % num_pieces;
            let mut start = self.lo[axis];
            (0..num_pieces)
                .map(|piece| {
                    let size = (base + usize::from(piece < remainder)) as i32;
                    let range = (start, start + size - 1);
                    start += size;
                    range
                })
                .collect()
        });
        iproduct!(&ranges[2], &ranges[1], &ranges[0])
            .map(|(&(zlo, zhi), &(ylo, yhi), &(xlo, xhi))| {
                Self::new([xlo, ylo, zlo], [xhi, yhi, zhi])
            })
            .collect()
    }

    /// Iterates over the cells of the box with the x index varying fastest.
    pub fn iter(&self) -> impl Iterator<Item = IntVect> {
        let Self { lo, hi } = *self;
        iproduct!(lo[2]..=hi[2], lo[1]..=hi[1], lo[0]..=hi[0]).map(|(k, j, i)| [i, j, k])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Low,
    High,
}

/// One of the `2 * SPACEDIM` faces of the domain.
///
/// Orientations are enumerated x-low, y-low, z-low, x-high, y-high, z-high.
/// Every per-face table is indexed in that order, and boundary dispatch visits
/// faces in that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Orientation {
    pub axis: usize,
    pub side: Side,
}

impl Orientation {
    pub const COUNT: usize = 2 * SPACEDIM;

    pub const fn new(axis: usize, side: Side) -> Self {
        Self { axis, side }
    }
    pub const fn low(axis: usize) -> Self {
        Self::new(axis, Side::Low)
    }
    pub const fn high(axis: usize) -> Self {
        Self::new(axis, Side::High)
    }

    pub const fn index(self) -> usize {
        match self.side {
            Side::Low => self.axis,
            Side::High => self.axis + SPACEDIM,
        }
    }

    pub fn from_index(index: usize) -> Self {
        assert!(index < Self::COUNT, "Orientation index {index} out of range");
        if index < SPACEDIM {
            Self::low(index)
        } else {
            Self::high(index - SPACEDIM)
        }
    }

    pub fn iter() -> impl Iterator<Item = Self> {
        Side::iter().flat_map(|side| (0..SPACEDIM).map(move |axis| Self::new(axis, side)))
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", ["x", "y", "z"][self.axis], self.side)
    }
}

/// Geometry of a single refinement level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    domain: IndexBox,
    prob_lo: [Float; SPACEDIM],
    cell_size: [Float; SPACEDIM],
    periodic: [bool; SPACEDIM],
}

impl Geometry {
    pub fn new(domain: IndexBox, prob_lo: [Float; SPACEDIM], prob_hi: [Float; SPACEDIM]) -> Self {
        assert!(!domain.is_empty(), "Domain box must not be empty");
        let cell_size = std::array::from_fn(|axis| {
            assert!(
                prob_hi[axis] > prob_lo[axis],
                "Physical extent along axis {axis} must be positive"
            );
            (prob_hi[axis] - prob_lo[axis]) / domain.length(axis) as Float
        });
        Self {
            domain,
            prob_lo,
            cell_size,
            periodic: [false; SPACEDIM],
        }
    }

    #[must_use]
    pub fn with_periodicity(self, periodic: [bool; SPACEDIM]) -> Self {
        Self { periodic, ..self }
    }

    pub const fn domain(&self) -> IndexBox {
        self.domain
    }
    pub const fn prob_lo(&self) -> [Float; SPACEDIM] {
        self.prob_lo
    }
    pub fn prob_hi(&self) -> [Float; SPACEDIM] {
        std::array::from_fn(|axis| {
            self.prob_lo[axis] + self.cell_size[axis] * self.domain.length(axis) as Float
        })
    }
    pub const fn cell_size(&self) -> [Float; SPACEDIM] {
        self.cell_size
    }
    pub fn inv_cell_size(&self) -> [Float; SPACEDIM] {
        self.cell_size.map(|dx| 1. / dx)
    }
    pub const fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }
    pub const fn periodicity(&self) -> [bool; SPACEDIM] {
        self.periodic
    }

    pub fn cell_center(&self, iv: IntVect) -> [Float; SPACEDIM] {
        std::array::from_fn(|axis| {
            self.prob_lo[axis]
                + (Float::from(iv[axis] - self.domain.lo()[axis]) + 0.5) * self.cell_size[axis]
        })
    }

    /// Physical coordinate of a domain face along its normal axis.
    pub fn face_coordinate(&self, ori: Orientation) -> Float {
        match ori.side {
            Side::Low => self.prob_lo[ori.axis],
            Side::High => self.prob_hi()[ori.axis],
        }
    }

    #[must_use]
    pub fn refine(&self, ratio: i32) -> Self {
        Self {
            domain: self.domain.refine(ratio),
            prob_lo: self.prob_lo,
            cell_size: self.cell_size.map(|dx| dx / Float::from(ratio)),
            periodic: self.periodic,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Level {
    geometry: Geometry,
    patches: Vec<IndexBox>,
}

/// A block-structured mesh: level 0 covers the domain, finer levels cover
/// disjoint patches of their refined domain.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    levels: Vec<Level>,
    max_grid_size: [usize; SPACEDIM],
    ref_ratio: i32,
}

impl Mesh {
    const DEFAULT_MAX_GRID_SIZE: usize = 32;

    pub fn new(domain: IndexBox, prob_lo: [Float; SPACEDIM], prob_hi: [Float; SPACEDIM]) -> Self {
        let geometry = Geometry::new(domain, prob_lo, prob_hi);
        let max_grid_size = [Self::DEFAULT_MAX_GRID_SIZE; SPACEDIM];
        Self {
            levels: vec![Level {
                geometry,
                patches: domain.chop(max_grid_size),
            }],
            max_grid_size,
            ref_ratio: 2,
        }
    }

    #[must_use]
    pub fn with_periodicity(self, periodic: [bool; SPACEDIM]) -> Self {
        let levels = self
            .levels
            .into_iter()
            .map(|level| Level {
                geometry: level.geometry.with_periodicity(periodic),
                ..level
            })
            .collect();
        Self { levels, ..self }
    }

    /// Re-decomposes the coarsest level. Must be called before finer levels
    /// are added.
    #[must_use]
    pub fn with_max_grid_size(mut self, max_grid_size: [usize; SPACEDIM]) -> Self {
        assert_eq!(
            self.levels.len(),
            1,
            "Maximum grid size must be set before adding refined levels"
        );
        self.max_grid_size = max_grid_size;
        let domain = self.levels[0].geometry.domain();
        self.levels[0].patches = domain.chop(max_grid_size);
        self
    }

    /// Adds a level refined by a factor of two over the current finest level,
    /// covering `boxes` (given in the index space of the new level).
    #[must_use]
    pub fn with_level(mut self, boxes: &[IndexBox]) -> Self {
        let geometry = self.geometry(self.finest_level()).refine(self.ref_ratio);
        let patches: Vec<_> = boxes
            .iter()
            .flat_map(|bx| {
                assert!(
                    geometry.domain().contains_box(bx),
                    "Patch {bx:?} lies outside the refined domain {:?}",
                    geometry.domain()
                );
                bx.chop(self.max_grid_size)
            })
            .collect();
        for (n, first) in patches.iter().enumerate() {
            for second in &patches[n + 1..] {
                assert!(
                    first.intersect(second).is_empty(),
                    "Patches {first:?} and {second:?} overlap"
                );
            }
        }
        log::debug!(
            "Adding level {} with {} patches",
            self.levels.len(),
            patches.len()
        );
        self.levels.push(Level { geometry, patches });
        self
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
    pub fn finest_level(&self) -> usize {
        self.levels.len() - 1
    }
    pub fn geometry(&self, lev: usize) -> &Geometry {
        &self.levels[lev].geometry
    }
    pub fn patches(&self, lev: usize) -> &[IndexBox] {
        &self.levels[lev].patches
    }
    pub const fn ref_ratio(&self) -> i32 {
        self.ref_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_basics() {
        let bx = IndexBox::new([0, 0, 0], [3, 4, 5]);
        assert_eq!(bx.shape(), [4, 5, 6]);
        assert_eq!(bx.num_cells(), 120);
        assert_eq!(bx.iter().count(), 120);
        assert_eq!(bx.iter().next(), Some([0, 0, 0]));
        assert_eq!(bx.iter().nth(1), Some([1, 0, 0]));
        assert!(bx.contains([3, 4, 5]));
        assert!(!bx.contains([4, 4, 5]));

        let empty = bx.with_range(1, 2, 1);
        assert!(empty.is_empty());
        assert_eq!(empty.num_cells(), 0);
        assert_eq!(empty.iter().count(), 0);
        assert!(bx.contains_box(&empty));

        assert_eq!(bx.grow(1), IndexBox::new([-1, -1, -1], [4, 5, 6]));
        assert_eq!(bx.refine(2), IndexBox::new([0, 0, 0], [7, 9, 11]));
        assert_eq!(bx.refine(2).coarsen(2), bx);
        assert!(bx
            .intersect(&IndexBox::new([4, 0, 0], [8, 8, 8]))
            .is_empty());
    }

    #[test]
    fn test_chop_covers_box() {
        let bx = IndexBox::new([0, -3, 2], [20, 9, 5]);
        let pieces = bx.chop([8, 5, 4]);
        assert_eq!(pieces.len(), 3 * 3);
        assert_eq!(
            pieces.iter().map(IndexBox::num_cells).sum::<usize>(),
            bx.num_cells()
        );
        for piece in &pieces {
            assert!(bx.contains_box(piece));
            assert!((0..SPACEDIM).all(|axis| piece.length(axis) <= [8, 5, 4][axis]));
        }
    }

    #[test]
    fn test_orientation_order() {
        let order: Vec<_> = Orientation::iter().map(|ori| ori.to_string()).collect();
        assert_eq!(
            order,
            ["x-low", "y-low", "z-low", "x-high", "y-high", "z-high"]
        );
        for (index, ori) in Orientation::iter().enumerate() {
            assert_eq!(ori.index(), index);
            assert_eq!(Orientation::from_index(index), ori);
        }
    }

    #[test]
    fn test_geometry() {
        let geom = Geometry::new(
            IndexBox::new([0, 0, 0], [7, 3, 3]),
            [0., -1., 0.],
            [2., 1., 1.],
        );
        assert_eq!(geom.cell_size(), [0.25, 0.5, 0.25]);
        assert_eq!(geom.inv_cell_size(), [4., 2., 4.]);
        assert_eq!(geom.cell_center([0, 0, 0]), [0.125, -0.75, 0.125]);
        assert_eq!(geom.face_coordinate(Orientation::high(0)), 2.);

        let fine = geom.refine(2);
        assert_eq!(fine.domain(), IndexBox::new([0, 0, 0], [15, 7, 7]));
        assert_eq!(fine.prob_hi(), geom.prob_hi());
    }

    #[test]
    fn test_mesh_levels() {
        let mesh = Mesh::new(IndexBox::new([0, 0, 0], [15, 15, 15]), [0.; 3], [1.; 3])
            .with_max_grid_size([8, 8, 16])
            .with_level(&[IndexBox::new([0, 0, 0], [15, 31, 7])]);
        assert_eq!(mesh.num_levels(), 2);
        assert_eq!(mesh.patches(0).len(), 4);
        assert_eq!(mesh.patches(1).len(), 2 * 4);
        assert_eq!(mesh.geometry(1).cell_size(), [1. / 32.; 3]);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_overlapping_patches_rejected() {
        let _ = Mesh::new(IndexBox::new([0, 0, 0], [7, 7, 7]), [0.; 3], [1.; 3]).with_level(&[
            IndexBox::new([0, 0, 0], [7, 7, 7]),
            IndexBox::new([4, 4, 4], [9, 9, 9]),
        ]);
    }
}
