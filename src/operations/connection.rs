//! Resolution of a symbolic connection into doorstep geometry.

use std::cmp::Ordering;

use num_traits::{One, Zero};
use tracing::debug;

use crate::arrangement::{Arrangement, Doorstep, HalfEdgeId, VertexId};
use crate::compiler::CompileConfig;
use crate::error::{CompileError, GeometryError, Result};
use crate::math::exact::{cross, dot_along, on_segment, squared_distance};
use crate::math::{ExactPoint, Scalar};
use crate::site::{BoundarySide, Connection, MarkerRef, SiteId, SiteTree};

/// Absolute exact geometry of one marker.
#[derive(Debug, Clone)]
struct MarkerGeometry {
    area: SiteId,
    left: ExactPoint,
    right: ExactPoint,
    /// Left to right along the contour, corners included.
    path: Vec<ExactPoint>,
    normal: (Scalar, Scalar),
}

impl MarkerGeometry {
    fn evaluate(tree: &SiteTree, marker: MarkerRef) -> Result<Self> {
        let area = tree.area(marker.area)?;
        let transform = tree.absolute_transform(marker.area)?;
        let m = tree.marker(marker)?;
        Ok(Self {
            area: marker.area,
            left: m.exact_point(&area.contour, &transform, BoundarySide::Left)?,
            right: m.exact_point(&area.contour, &transform, BoundarySide::Right)?,
            path: m.exact_path(&area.contour, &transform)?,
            normal: m.inward_normal(&area.contour, &transform)?,
        })
    }
}

/// A jamb joins a point of the source marker to the facing point of the
/// target marker.
#[derive(Debug, Clone)]
struct Jamb {
    near: ExactPoint,
    far: ExactPoint,
    length: f64,
}

impl Jamb {
    fn new(near: &ExactPoint, far: &ExactPoint) -> Self {
        Self {
            length: (far.to_point() - near.to_point()).norm(),
            near: near.clone(),
            far: far.clone(),
        }
    }
}

/// The doorstep produced by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDoorstep {
    /// Half-edge whose left side faces the source area.
    pub source_side: HalfEdgeId,
    /// Its twin, facing the target area.
    pub target_side: HalfEdgeId,
}

/// Turns a connection between two boundary markers into a tagged doorstep
/// edge.
///
/// Touching markers (collinear within `connection_min_dist` and sharing
/// more than that of their line) reuse the shared contour: the overlap of
/// the two marker segments becomes the doorstep. Markers facing each other
/// across a gap are bridged: each jamb is inserted, the edge spanning the
/// gap (the bisector) is split at its midpoint, the midpoints are joined by
/// the doorstep, and the jamb stubs and both contour openings are removed.
#[derive(Debug)]
pub struct ResolveConnection<'a> {
    tree: &'a SiteTree,
    connection: Connection,
    min_dist: f64,
    max_dist: f64,
    overshoot: f64,
}

impl<'a> ResolveConnection<'a> {
    #[must_use]
    pub fn new(tree: &'a SiteTree, connection: Connection, config: &CompileConfig) -> Self {
        Self {
            tree,
            connection,
            min_dist: config.connection_min_dist,
            max_dist: config.connection_max_dist,
            overshoot: config.jamb_overshoot,
        }
    }

    /// Executes the resolution.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::ConnectionFailed` if the markers are on the same
    /// area, too far apart, not uniquely bridged, or if an edge to remove
    /// cannot be found.
    pub fn execute(&self, arrangement: &mut Arrangement) -> Result<ResolvedDoorstep> {
        let Connection { source, target } = self.connection;
        if source.area == target.area {
            return Err(failed("both markers belong to the same area"));
        }
        let a = MarkerGeometry::evaluate(self.tree, source)?;
        let b = MarkerGeometry::evaluate(self.tree, target)?;

        let overlap = self.touching_overlap(&a, &b)?;
        let doorstep = if let Some((from, to)) = &overlap {
            Self::resolve_flush(arrangement, from, to)?
        } else {
            let jambs = Self::pick_jambs(&a, &b);
            if let Some(long) = jambs.iter().find(|j| j.length > self.max_dist) {
                return Err(failed(&format!(
                    "jamb of length {} exceeds {}",
                    long.length, self.max_dist
                )));
            }
            match jambs.iter().filter(|j| j.length <= self.min_dist).count() {
                0 => self.resolve_bridged(arrangement, &jambs, &a, &b)?,
                1 => return Err(failed("one jamb touches and the other spans a gap")),
                _ => return Err(failed("touching markers do not overlap")),
            }
        };

        let resolved = Self::tag(arrangement, doorstep, &a, &b)?;
        debug!(flush = overlap.is_some(), "resolved connection");
        Ok(resolved)
    }

    /// Returns the shared part of two touching markers: both ends of `b` lie
    /// within `min_dist` of the line through `a`, and the two segments share
    /// more than `min_dist` of it.
    fn touching_overlap(
        &self,
        a: &MarkerGeometry,
        b: &MarkerGeometry,
    ) -> Result<Option<(ExactPoint, ExactPoint)>> {
        if a.left == a.right {
            return Ok(None);
        }
        let tol = Scalar::from_float(self.min_dist).ok_or(GeometryError::NonFinite {
            x: self.min_dist,
            y: 0.0,
        })?;
        let len2 = squared_distance(&a.left, &a.right);
        // Squared distances along or off the line, scaled by `len2`.
        let bound = &tol * &tol * &len2;
        for q in [&b.left, &b.right] {
            let off = cross(&a.left, &a.right, q);
            if &off * &off > bound {
                return Ok(None);
            }
        }

        let mut ends = [
            (dot_along(&a.left, &a.right, &b.left), &b.left),
            (dot_along(&a.left, &a.right, &b.right), &b.right),
        ];
        if ends[0].0 > ends[1].0 {
            ends.swap(0, 1);
        }
        let [(b_lo, b_lo_point), (b_hi, b_hi_point)] = ends;
        let (lo, from) = if b_lo > Scalar::zero() {
            (b_lo, b_lo_point)
        } else {
            (Scalar::zero(), &a.left)
        };
        let (hi, to) = if b_hi < len2 { (b_hi, b_hi_point) } else { (len2, &a.right) };
        let shared = hi - lo;
        if shared <= Scalar::zero() || &shared * &shared <= bound {
            return Ok(None);
        }
        Ok(Some((from.clone(), to.clone())))
    }

    /// Pairs facing points; mirrored areas flip marker sides, so the crossed
    /// pairing is used when it is shorter.
    fn pick_jambs(a: &MarkerGeometry, b: &MarkerGeometry) -> [Jamb; 2] {
        let straight = [Jamb::new(&a.left, &b.right), Jamb::new(&a.right, &b.left)];
        let crossed = [Jamb::new(&a.left, &b.left), Jamb::new(&a.right, &b.right)];
        let total = |js: &[Jamb; 2]| js[0].length + js[1].length;
        if total(&crossed) < total(&straight) {
            crossed
        } else {
            straight
        }
    }

    fn resolve_flush(arrangement: &mut Arrangement, from: &ExactPoint, to: &ExactPoint) -> Result<HalfEdgeId> {
        let induced = arrangement.insert_segment(from, to)?;
        match induced.as_slice() {
            [single] => Ok(*single),
            _ => Err(failed(&format!(
                "doorstep segment induced {} edges",
                induced.len()
            ))),
        }
    }

    fn resolve_bridged(
        &self,
        arrangement: &mut Arrangement,
        jambs: &[Jamb; 2],
        a: &MarkerGeometry,
        b: &MarkerGeometry,
    ) -> Result<HalfEdgeId> {
        let k = Scalar::from_float(self.overshoot)
            .ok_or(GeometryError::NonFinite { x: self.overshoot, y: 0.0 })?;
        let mut removals: Vec<HalfEdgeId> = Vec::new();
        let mut midpoints: Vec<ExactPoint> = Vec::with_capacity(2);
        let back = -k.clone();
        let forward = Scalar::one() + &k;

        for jamb in jambs {
            let start = jamb.near.lerp(&jamb.far, &back);
            let end = jamb.near.lerp(&jamb.far, &forward);
            let induced = arrangement.insert_segment(&start, &end)?;

            let ends: Vec<VertexId> = [&start, &end]
                .into_iter()
                .filter_map(|p| arrangement.vertex_at(p))
                .collect();
            let mut bisectors = Vec::new();
            for h in induced {
                let touches_end = ends.contains(&arrangement.origin(h)?) || ends.contains(&arrangement.target(h)?);
                if touches_end {
                    removals.push(h);
                } else {
                    bisectors.push(h);
                }
            }
            let [bisector] = bisectors.as_slice() else {
                return Err(failed(&format!(
                    "expected one bisector edge, found {}",
                    bisectors.len()
                )));
            };
            let mid = arrangement
                .source_point(*bisector)?
                .midpoint(arrangement.target_point(*bisector)?);
            arrangement.split_edge(*bisector, &mid)?;
            midpoints.push(mid);
        }

        let induced = arrangement.insert_segment(&midpoints[0], &midpoints[1])?;
        let [doorstep] = induced.as_slice() else {
            return Err(failed(&format!(
                "doorstep segment induced {} edges",
                induced.len()
            )));
        };

        for path in [&a.path, &b.path] {
            for pair in path.windows(2) {
                removals.extend(contour_chain(arrangement, &pair[0], &pair[1])?);
            }
        }

        for h in removals {
            if !arrangement.contains_half_edge(h) {
                return Err(failed("edge recorded for removal has vanished"));
            }
            arrangement.remove_edge(h)?;
        }
        if !arrangement.contains_half_edge(*doorstep) {
            return Err(failed("doorstep removed with the redundant edges"));
        }
        Ok(*doorstep)
    }

    /// Tags the half-edge whose left side faces the source area with that
    /// area, and its twin with the target area.
    fn tag(
        arrangement: &mut Arrangement,
        doorstep: HalfEdgeId,
        a: &MarkerGeometry,
        b: &MarkerGeometry,
    ) -> Result<ResolvedDoorstep> {
        let twin = arrangement.twin(doorstep)?;
        let p = arrangement.source_point(doorstep)?;
        let q = arrangement.target_point(doorstep)?;
        let ex = &q.x - &p.x;
        let ey = &q.y - &p.y;
        let (nx, ny) = &a.normal;
        let side = (ex * ny - ey * nx).cmp(&Scalar::zero());
        let (source_side, target_side) = match side {
            Ordering::Greater => (doorstep, twin),
            Ordering::Less => (twin, doorstep),
            Ordering::Equal => return Err(failed("doorstep is parallel to the area normal")),
        };
        arrangement.set_doorstep(source_side, Doorstep { area: a.area })?;
        arrangement.set_doorstep(target_side, Doorstep { area: b.area })?;
        Ok(ResolvedDoorstep {
            source_side,
            target_side,
        })
    }
}

/// Half-edges along the straight contour piece from `from` to `to`, which
/// may have been split by earlier insertions.
fn contour_chain(arrangement: &Arrangement, from: &ExactPoint, to: &ExactPoint) -> Result<Vec<HalfEdgeId>> {
    let missing = || failed("opening edge between the jambs not found");
    let mut current = arrangement.vertex_at(from).ok_or_else(missing)?;
    let end = arrangement.vertex_at(to).ok_or_else(missing)?;
    let mut chain = Vec::new();
    while current != end {
        let here = arrangement.point(current)?;
        let mut step = None;
        for &h in &arrangement.vertex(current)?.outgoing {
            if on_segment(arrangement.target_point(h)?, here, to) {
                step = Some(h);
                break;
            }
        }
        let h = step.ok_or_else(missing)?;
        chain.push(h);
        current = arrangement.target(h)?;
    }
    Ok(chain)
}

fn failed(message: &str) -> crate::error::FloorplanError {
    CompileError::ConnectionFailed(message.to_owned()).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FloorplanError;
    use crate::math::polygon_2d::Orientation;
    use crate::math::{Point2, TOLERANCE};
    use crate::operations::build::BuildArrangement;
    use crate::site::{BoundaryKind, BoundaryMarker, Site};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    fn marker(edge: usize) -> BoundaryMarker {
        BoundaryMarker::new(edge, 0.5, 0.4, BoundaryKind::Exterior)
    }

    /// Two unit squares, `a` at the origin and `b` shifted right by
    /// `1 + gap`, with markers on the facing sides.
    fn pair(gap: f64) -> (SiteTree, Connection) {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 1.0, 1.0), vec![marker(1)]));
        let x = 1.0 + gap;
        let b = tree.add_root(Site::area("b", rect(x, 0.0, x + 1.0, 1.0), vec![marker(3)]));
        let connection = Connection {
            source: MarkerRef::new(a, 0),
            target: MarkerRef::new(b, 0),
        };
        (tree, connection)
    }

    fn built(tree: &SiteTree) -> Arrangement {
        let mut arr = Arrangement::new();
        BuildArrangement::new(tree, Orientation::CounterClockwise)
            .execute(&mut arr)
            .unwrap();
        arr
    }

    fn endpoints(arr: &Arrangement, h: HalfEdgeId) -> (Point2, Point2) {
        (
            arr.source_point(h).unwrap().to_point(),
            arr.target_point(h).unwrap().to_point(),
        )
    }

    #[test]
    fn flush_connection_reuses_shared_edge() {
        let (tree, connection) = pair(0.0);
        let mut arr = built(&tree);
        let before = arr.total_edge_length();
        let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap();

        assert!((arr.total_edge_length() - before).abs() < TOLERANCE);
        let (p, q) = endpoints(&arr, resolved.source_side);
        // Left side faces area a (x < 1): the half-edge runs upward.
        assert!((p.x - 1.0).abs() < TOLERANCE && (q.x - 1.0).abs() < TOLERANCE);
        assert!((p.y - 0.3).abs() < 1e-9 && (q.y - 0.7).abs() < 1e-9);
        assert_eq!(arr.doorstep(resolved.source_side).unwrap().area, connection.source.area);
        assert_eq!(arr.doorstep(resolved.target_side).unwrap().area, connection.target.area);
        assert_eq!(arr.twin(resolved.source_side).unwrap(), resolved.target_side);
    }

    #[test]
    fn bridged_connection_spans_the_gap() {
        let (tree, connection) = pair(0.2);
        let mut arr = built(&tree);
        let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap();

        let (p, q) = endpoints(&arr, resolved.source_side);
        assert!((p.x - 1.1).abs() < 1e-9 && (q.x - 1.1).abs() < 1e-9);
        assert!((p.y - 0.3).abs() < 1e-9 && (q.y - 0.7).abs() < 1e-9);
        assert_eq!(arr.doorstep_count(), 2);

        // Both facing sides are open between the jambs.
        let blocked = |x: f64| {
            arr.segments().iter().any(|(p, q, _)| {
                (p.x - x).abs() < 1e-9 && (q.x - x).abs() < 1e-9 && ((p.y + q.y) * 0.5 - 0.5).abs() < 1e-9
            })
        };
        assert!(!blocked(1.0));
        assert!(!blocked(1.2));
        // Stubs are gone: no dangling vertex is left.
        assert!(arr
            .vertex_ids()
            .all(|v| arr.vertex(v).unwrap().outgoing.len() >= 2));
        // 4 + 4 square sides split by the jambs (+2 each), 4 corridor pieces, 1 doorstep.
        assert_eq!(arr.edge_count(), 4 + 4 + 2 + 2 - 2 + 4 + 1);

        arr.rebuild_faces().unwrap();
        assert_eq!(arr.face_count().unwrap(), 2);
        assert_ne!(
            arr.incident_face(resolved.source_side).unwrap(),
            arr.incident_face(resolved.target_side).unwrap()
        );
    }

    #[test]
    fn doorstep_survives_later_insertions() {
        let (tree, connection) = pair(0.0);
        let mut arr = built(&tree);
        let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap();
        arr.insert_segment(&ExactPoint::from_integers(5, 5), &ExactPoint::from_integers(6, 5))
            .unwrap();
        // Crosses the doorstep at (1, 0.5).
        let half = ExactPoint::from_f64(0.5, 0.5).unwrap();
        let across = ExactPoint::from_f64(1.5, 0.5).unwrap();
        arr.insert_segment(&half, &across).unwrap();
        assert!(arr.is_doorstep(resolved.source_side));
        assert!(arr.is_doorstep(resolved.target_side));
        assert_eq!(arr.twin(resolved.source_side).unwrap(), resolved.target_side);
        assert_eq!(arr.doorstep_count(), 4);
    }

    /// Touching unit squares with markers of the given (offset, width) on
    /// the shared side.
    fn touching(a_marker: (f64, f64), b_marker: (f64, f64)) -> (SiteTree, Connection) {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area(
            "a",
            rect(0.0, 0.0, 1.0, 1.0),
            vec![BoundaryMarker::new(1, a_marker.0, a_marker.1, BoundaryKind::Exterior)],
        ));
        let b = tree.add_root(Site::area(
            "b",
            rect(1.0, 0.0, 2.0, 1.0),
            vec![BoundaryMarker::new(3, b_marker.0, b_marker.1, BoundaryKind::Exterior)],
        ));
        let connection = Connection {
            source: MarkerRef::new(a, 0),
            target: MarkerRef::new(b, 0),
        };
        (tree, connection)
    }

    fn assert_vertical_doorstep(arr: &Arrangement, h: HalfEdgeId, y0: f64, y1: f64) {
        let (p, q) = endpoints(arr, h);
        assert!((p.x - 1.0).abs() < 1e-9 && (q.x - 1.0).abs() < 1e-9);
        assert!((p.y - y0).abs() < 1e-9 && (q.y - y1).abs() < 1e-9, "{p:?} -> {q:?}");
    }

    #[test]
    fn touching_markers_of_different_widths() {
        let (tree, connection) = touching((0.5, 0.4), (0.5, 0.6));
        for connection in [
            connection,
            Connection {
                source: connection.target,
                target: connection.source,
            },
        ] {
            let mut arr = built(&tree);
            let before = arr.total_edge_length();
            let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
                .execute(&mut arr)
                .unwrap();
            assert!((arr.total_edge_length() - before).abs() < TOLERANCE);
            assert_eq!(arr.doorstep_count(), 2);
            // The narrower marker bounds the doorstep.
            let a_side = if connection.source.area == tree.roots()[0] {
                resolved.source_side
            } else {
                resolved.target_side
            };
            assert_vertical_doorstep(&arr, a_side, 0.3, 0.7);
        }
    }

    #[test]
    fn touching_markers_share_their_overlap() {
        // a covers y in [0.3, 0.7], b covers [0.2, 0.6].
        let (tree, connection) = touching((0.5, 0.4), (0.6, 0.4));
        let mut arr = built(&tree);
        let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap();
        assert_vertical_doorstep(&arr, resolved.source_side, 0.3, 0.6);
    }

    #[test]
    fn collinear_markers_without_overlap_fail() {
        // a covers y in [0.3, 0.7], b covers [0.8, 1.0].
        let (tree, connection) = touching((0.5, 0.4), (0.1, 0.2));
        let mut arr = built(&tree);
        let err = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::ConnectionFailed(_))));
    }

    #[test]
    fn markers_wrapping_corners_are_bridged() {
        // a wraps its top right corner, b its bottom left corner, across a
        // diagonal gap.
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area(
            "a",
            rect(0.0, 0.0, 1.0, 1.0),
            vec![BoundaryMarker::new(1, 0.9, 0.4, BoundaryKind::Exterior)],
        ));
        let b = tree.add_root(Site::area(
            "b",
            rect(1.2, 1.2, 2.2, 2.2),
            vec![BoundaryMarker::new(0, 0.1, 0.4, BoundaryKind::Exterior)],
        ));
        let connection = Connection {
            source: MarkerRef::new(a, 0),
            target: MarkerRef::new(b, 0),
        };
        let mut arr = built(&tree);
        let resolved = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap();

        // Both wrapped corners went with the openings.
        assert!(arr.vertex_at(&ExactPoint::from_integers(1, 1)).is_none());
        assert!(arr.vertex_at(&ExactPoint::from_f64(1.2, 1.2).unwrap()).is_none());
        assert!(arr
            .vertex_ids()
            .all(|v| arr.vertex(v).unwrap().outgoing.len() >= 2));

        let (p, q) = endpoints(&arr, resolved.source_side);
        assert!((p - Point2::new(1.25, 0.95)).norm() < 1e-9);
        assert!((q - Point2::new(1.05, 1.15)).norm() < 1e-9);

        arr.rebuild_faces().unwrap();
        assert_eq!(arr.face_count().unwrap(), 2);
        assert_ne!(
            arr.incident_face(resolved.source_side).unwrap(),
            arr.incident_face(resolved.target_side).unwrap()
        );
    }

    #[test]
    fn same_area_fails() {
        let (tree, connection) = pair(0.0);
        let mut arr = built(&tree);
        let bad = Connection {
            source: connection.source,
            target: connection.source,
        };
        let err = ResolveConnection::new(&tree, bad, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::ConnectionFailed(_))));
        assert!(err.to_string().starts_with("Failed to construct connection"));
    }

    #[test]
    fn distant_markers_fail() {
        let (tree, connection) = pair(2.0);
        let mut arr = built(&tree);
        let err = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::ConnectionFailed(_))));
    }

    #[test]
    fn blocked_gap_fails() {
        let (mut tree, connection) = pair(0.2);
        // A thin wall inside the gap splits each jamb into two gap edges.
        tree.add_root(Site::wall("blocker", rect(1.05, -1.0, 1.15, 2.0)));
        let mut arr = built(&tree);
        let err = ResolveConnection::new(&tree, connection, &CompileConfig::default())
            .execute(&mut arr)
            .unwrap_err();
        assert!(err.to_string().contains("bisector"));
    }
}
