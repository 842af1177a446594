//! Nearest-pair matching of exterior markers, used by the editing layer to
//! propose connections.

use tracing::debug;

use super::{BoundaryKind, BoundarySide, MarkerRef, SiteTree};
use crate::compiler::CompileConfig;
use crate::error::Result;
use crate::math::Point2;

/// Pairs `Exterior` markers of different areas whose mid points are at most
/// `connection_max_dist` apart, closest pairs first. Touching markers pair
/// at distance zero. Each marker is used at most once. Areas whose contour
/// is not a simple ring are skipped.
///
/// # Errors
///
/// Returns an error if a site transform or contour coordinate is not
/// finite.
pub fn pair_markers(tree: &SiteTree, config: &CompileConfig) -> Result<Vec<(MarkerRef, MarkerRef)>> {
    let mut mids: Vec<(MarkerRef, Point2)> = Vec::new();
    for area_id in tree.areas() {
        if tree.simple_contour(area_id)?.is_none() {
            continue;
        }
        let area = tree.area(area_id)?;
        let transform = tree.absolute_transform(area_id)?;
        for (index, marker) in area.boundaries.iter().enumerate() {
            if marker.kind != BoundaryKind::Exterior {
                continue;
            }
            let mid = marker.exact_point(&area.contour, &transform, BoundarySide::Mid)?;
            mids.push((MarkerRef::new(area_id, index), mid.to_point()));
        }
    }

    let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
    for i in 0..mids.len() {
        for j in (i + 1)..mids.len() {
            if mids[i].0.area == mids[j].0.area {
                continue;
            }
            let d = (mids[j].1 - mids[i].1).norm();
            if d <= config.connection_max_dist {
                candidates.push((d, i, j));
            }
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut used = vec![false; mids.len()];
    let mut pairs = Vec::new();
    for (_, i, j) in candidates {
        if used[i] || used[j] {
            continue;
        }
        used[i] = true;
        used[j] = true;
        pairs.push((mids[i].0, mids[j].0));
    }
    debug!(markers = mids.len(), pairs = pairs.len(), "paired exterior markers");
    Ok(pairs)
}
