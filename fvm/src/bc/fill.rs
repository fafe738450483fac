use rayon::prelude::*;

use crate::{
    bc::BcFunctor,
    field::{Field, GhostBc, PatchArray},
    geom::{IndexBox, Orientation, Side},
    Float,
};

/// Runs `functor` once on every ghost cell outside the domain, for all
/// components, on every patch of every level.
pub fn apply_bc_functor<F: BcFunctor>(field: &mut Field, functor: &F, time: Float) {
    let num_comp = field.num_comp();
    let bcr = field.bc_recs().to_vec();
    log::debug!(
        "Applying boundary functor to {} on {} levels",
        field.name(),
        field.num_levels()
    );
    for lev in 0..field.num_levels() {
        let geom = *field.mesh().geometry(lev);
        let domain = geom.domain();
        field.patches_mut(lev).par_iter_mut().for_each(|arr| {
            let mut remaining = arr.grown_box();
            if domain.contains_box(&remaining) {
                return;
            }
            // Each strip is cut off `remaining` once visited, so edge and
            // corner cells are visited through the first face they lie beyond.
            for ori in Orientation::iter() {
                let strip = ghost_strip(remaining, &domain, ori);
                if strip.is_empty() {
                    continue;
                }
                for iv in strip.iter() {
                    functor.fill(iv, arr, 0, num_comp, &geom, time, &bcr, 0, 0);
                }
                let axis = ori.axis;
                remaining = match ori.side {
                    Side::Low => {
                        remaining.with_range(axis, domain.lo()[axis], remaining.hi()[axis])
                    }
                    Side::High => {
                        remaining.with_range(axis, remaining.lo()[axis], domain.hi()[axis])
                    }
                };
            }
        });
    }
}

/// Fills ghost cells on non-periodic faces whose ghost type derives from
/// interior values: first- and second-order extrapolation and even/odd
/// reflection. External Dirichlet and interior ghost cells are left alone.
pub fn fill_extrapolated(field: &mut Field) {
    let bcr = field.bc_recs().to_vec();
    log::debug!("Extrapolating ghost cells of {}", field.name());
    for lev in 0..field.num_levels() {
        let geom = *field.mesh().geometry(lev);
        let domain = geom.domain();
        field.patches_mut(lev).par_iter_mut().for_each(|arr| {
            for ori in Orientation::iter() {
                if geom.is_periodic(ori.axis) {
                    continue;
                }
                let strip = ghost_strip(arr.grown_box(), &domain, ori);
                if strip.is_empty() {
                    continue;
                }
                for (comp, bc_rec) in bcr.iter().enumerate() {
                    let bc = bc_rec.get(ori);
                    if matches!(bc, GhostBc::Interior | GhostBc::ExtDir) {
                        continue;
                    }
                    extrapolate(arr, &strip, &domain, ori, comp, bc);
                }
            }
        });
    }
}

/// Extrapolation followed by the boundary functor.
pub fn fill_physical_bc<F: BcFunctor>(field: &mut Field, functor: &F, time: Float) {
    fill_extrapolated(field);
    apply_bc_functor(field, functor, time);
}

/// Cells of `grown` lying beyond the face `ori` of `domain`.
fn ghost_strip(grown: IndexBox, domain: &IndexBox, ori: Orientation) -> IndexBox {
    let axis = ori.axis;
    match ori.side {
        Side::Low => grown.with_range(
            axis,
            grown.lo()[axis],
            grown.hi()[axis].min(domain.lo()[axis] - 1),
        ),
        Side::High => grown.with_range(
            axis,
            grown.lo()[axis].max(domain.hi()[axis] + 1),
            grown.hi()[axis],
        ),
    }
}

fn extrapolate(
    arr: &mut PatchArray,
    strip: &IndexBox,
    domain: &IndexBox,
    ori: Orientation,
    comp: usize,
    bc: GhostBc,
) {
    let axis = ori.axis;
    let grown = arr.grown_box();
    // First valid cell along the normal, and the direction pointing inward.
    let (edge, inward) = match ori.side {
        Side::Low => (domain.lo()[axis], 1),
        Side::High => (domain.hi()[axis], -1),
    };
    let clamp = |index: i32| index.clamp(grown.lo()[axis], grown.hi()[axis]);
    for iv in strip.iter() {
        // Distance of the ghost cell from the face, in cells (1 for the first
        // ghost layer).
        let depth = (iv[axis] - edge).abs();
        let at = |index: i32| {
            let mut src = iv;
            src[axis] = clamp(index);
            src
        };
        let value = match bc {
            GhostBc::Foextrap => arr[(at(edge), comp)],
            GhostBc::HoExtrap => {
                let mut interior = [0.; 3];
                let mut num_interior = 0;
                for (k, value) in interior.iter_mut().enumerate() {
                    let mut src = iv;
                    src[axis] = edge + inward * k as i32;
                    if !grown.contains(src) {
                        break;
                    }
                    *value = arr[(src, comp)];
                    num_interior += 1;
                }
                high_order_extrapolation(&interior[..num_interior], depth)
            }
            GhostBc::ReflectEven => arr[(at(edge + inward * (depth - 1)), comp)],
            GhostBc::ReflectOdd => -arr[(at(edge + inward * (depth - 1)), comp)],
            GhostBc::Interior | GhostBc::ExtDir => continue,
        };
        arr[(iv, comp)] = value;
    }
}

/// Extrapolates from the values of the first cells inside the face, nearest
/// first. The first ghost layer receives the value on the face itself, which
/// is what the one-sided stencils read; deeper layers receive the value at
/// their cell centers. Second order when three interior values are available.
fn high_order_extrapolation(interior: &[Float], depth: i32) -> Float {
    // Position in cell widths, with the first interior center at 0 and the
    // ghost side negative.
    let x = if depth == 1 { -0.5 } else { -Float::from(depth) };
    match *interior {
        [v0, v1, v2, ..] => {
            0.5 * (x - 1.) * (x - 2.) * v0 - x * (x - 2.) * v1 + 0.5 * x * (x - 1.) * v2
        }
        [v0, v1] => v0 + x * (v1 - v0),
        [v0] => v0,
        [] => 0.,
    }
}
