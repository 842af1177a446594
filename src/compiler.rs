//! Floorplan compilation: site tree in, classified faces and walls out.

use tracing::{debug, info, trace};

use crate::arrangement::{Arrangement, HalfEdgeId};
use crate::error::{CompileError, Result};
use crate::math::polygon_2d::{reorient, rotate_to_canonical_start, signed_area_2d, Orientation};
use crate::math::Point2;
use crate::operations::walls::{flatten_loop, ExtractWalls, NestContours, StitchSections};
use crate::operations::{BuildArrangement, ClassifyFaces, ResolveConnection};
use crate::output::{Compilation, Floorplan, PolygonWithHoles, Wall};
use crate::site::SiteTree;

/// Optional pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passes {
    /// Resolve connection sites into doorsteps.
    pub connections: bool,
    /// Extract, stitch and nest walls.
    pub walls: bool,
}

impl Default for Passes {
    fn default() -> Self {
        Self {
            connections: true,
            walls: true,
        }
    }
}

/// Settings threaded through one compilation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileConfig {
    /// Endpoint tolerance used when stitching wall sections.
    pub max_connection_length: f64,
    /// Distance within which two markers count as touching.
    pub connection_min_dist: f64,
    /// Jambs longer than this cannot be bridged.
    pub connection_max_dist: f64,
    /// Fraction of a jamb's length added past each wall when the jamb line
    /// is inserted.
    pub jamb_overshoot: f64,
    pub passes: Passes,
    pub target_orientation: Orientation,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_connection_length: 0.5,
            connection_min_dist: 1e-9,
            connection_max_dist: 1.0,
            jamb_overshoot: 0.25,
            passes: Passes::default(),
            target_orientation: Orientation::CounterClockwise,
        }
    }
}

/// Runs the whole pipeline: build, connect, classify, then walls.
#[derive(Debug, Default)]
pub struct Compiler {
    config: CompileConfig,
}

impl Compiler {
    #[must_use]
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Compiles a site tree snapshot.
    ///
    /// # Errors
    ///
    /// Any integrity violation aborts the run: a connection that cannot be
    /// resolved, a lost doorstep, a doorstep inside a wall span, a wall gap
    /// wider than `max_connection_length`, or overlapping wall loops.
    pub fn execute(&self, tree: &SiteTree) -> Result<Compilation> {
        let mut arrangement = Arrangement::new();
        let report = BuildArrangement::new(tree, self.config.target_orientation).execute(&mut arrangement)?;
        debug!(
            inserted = report.inserted,
            skipped = report.skipped,
            edges = arrangement.edge_count(),
            "built arrangement"
        );

        let mut doorsteps = Vec::new();
        if self.config.passes.connections {
            for id in tree.connections() {
                let site = tree.site(id)?;
                let connection = *site.as_connection().ok_or_else(|| {
                    CompileError::InvalidSite(format!("{} is not a connection", site.name))
                })?;
                let resolved = ResolveConnection::new(tree, connection, &self.config).execute(&mut arrangement)?;
                doorsteps.push(resolved.source_side);
                doorsteps.push(resolved.target_side);
            }
            debug!(doorsteps = doorsteps.len() / 2, "resolved connections");
        }
        verify_doorsteps(&arrangement, &doorsteps)?;

        arrangement.rebuild_faces()?;
        let classes = ClassifyFaces::new().execute(&arrangement)?;

        let mut floorplan = Floorplan::default();
        for &face_id in &classes.floors {
            let face = arrangement.face(face_id)?;
            let outer = match face.outer {
                Some(h) => ring(&arrangement, h)?,
                None => Vec::new(),
            };
            let holes = face
                .holes
                .iter()
                .map(|&h| ring(&arrangement, h))
                .collect::<Result<Vec<_>>>()?;
            floorplan.floors.push(PolygonWithHoles::new(outer, holes));
        }
        for &face_id in &classes.fillers {
            if let Some(h) = arrangement.face(face_id)?.outer {
                floorplan.fillers.push(ring(&arrangement, h)?);
            }
        }

        if self.config.passes.walls {
            let faces: Vec<_> = classes.floors.iter().chain(&classes.fillers).copied().collect();
            let sections = ExtractWalls::new(&faces).execute(&arrangement)?;
            let lists = StitchSections::new(sections, self.config.max_connection_length).execute()?;
            let loops = distinct_loops(
                lists
                    .iter()
                    .map(|list| flatten_loop(list))
                    .filter(|points| points.len() >= 3),
            );
            floorplan.walls = loops
                .iter()
                .map(|points| Wall {
                    closed: true,
                    counter_clockwise: signed_area_2d(points) > 0.0,
                    points: points.clone(),
                })
                .collect();
            floorplan.contours = NestContours::new(&loops).execute()?;
        }

        info!(
            floors = floorplan.floors.len(),
            fillers = floorplan.fillers.len(),
            walls = floorplan.walls.len(),
            doorsteps = doorsteps.len() / 2,
            "compiled floorplan"
        );
        Ok(Compilation {
            arrangement,
            floor_faces: classes.floors,
            filler_faces: classes.fillers,
            doorsteps,
            floorplan,
        })
    }
}

fn ring(arrangement: &Arrangement, start: HalfEdgeId) -> Result<Vec<Point2>> {
    Ok(arrangement
        .cycle_points(start)?
        .iter()
        .map(crate::math::ExactPoint::to_point)
        .collect())
}

/// Keeps the first of any loops that trace the same ring. A filler in a
/// floor's hole yields the hole's ring a second time, walked the other way.
fn distinct_loops(loops: impl Iterator<Item = Vec<Point2>>) -> Vec<Vec<Point2>> {
    let mut seen: Vec<Vec<Point2>> = Vec::new();
    let mut kept = Vec::new();
    for points in loops {
        let key = rotate_to_canonical_start(&reorient(&points, Orientation::CounterClockwise));
        if seen.contains(&key) {
            trace!(points = points.len(), "dropped coincident wall loop");
            continue;
        }
        seen.push(key);
        kept.push(points);
    }
    kept
}

/// Every recorded doorstep half-edge must still exist and carry its tag.
fn verify_doorsteps(arrangement: &Arrangement, doorsteps: &[HalfEdgeId]) -> Result<()> {
    for (i, &h) in doorsteps.iter().enumerate() {
        if !arrangement.contains_half_edge(h) || !arrangement.is_doorstep(h) {
            return Err(CompileError::DoorstepLost(format!(
                "doorstep {} of connection {} is no longer tagged",
                i % 2,
                i / 2
            ))
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::FloorplanError;
    use crate::math::{snap_delta, Transform, Vector2, TOLERANCE};
    use crate::site::{BoundaryKind, BoundaryMarker, MarkerRef, Site};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

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

    /// Two unit squares `gap` apart with a connection between their facing
    /// sides.
    fn connected_pair(gap: f64) -> SiteTree {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 1.0, 1.0), vec![marker(1)]));
        let x = 1.0 + gap;
        let b = tree.add_root(Site::area("b", rect(x, 0.0, x + 1.0, 1.0), vec![marker(3)]));
        tree.add_root(Site::connection("door", MarkerRef::new(a, 0), MarkerRef::new(b, 0)));
        tree
    }

    fn compile(tree: &SiteTree) -> Compilation {
        Compiler::default().execute(tree).unwrap()
    }

    fn compile_with(tree: &SiteTree, config: CompileConfig) -> Result<Compilation> {
        Compiler::new(config).execute(tree)
    }

    #[test]
    fn single_rectangle() {
        init_tracing();
        let mut tree = SiteTree::new();
        let input = rect(0.0, 0.0, 4.0, 3.0);
        tree.add_root(Site::area("room", input.clone(), Vec::new()));
        let result = compile(&tree);

        assert_eq!(result.arrangement.face_count().unwrap(), 1);
        assert_eq!(result.arrangement.doorstep_count(), 0);
        assert!(result.doorsteps.is_empty());
        assert!(result.floor_faces.is_empty());
        assert_eq!(result.filler_faces.len(), 1);

        let walls = &result.floorplan.walls;
        assert_eq!(walls.len(), 1);
        assert!(walls[0].closed && walls[0].counter_clockwise);
        assert_eq!(rotate_to_canonical_start(&walls[0].points), input);
        assert_eq!(result.floorplan.contours.len(), 1);
        assert!(result.floorplan.contours[0].holes.is_empty());
    }

    #[test]
    fn clockwise_input_is_reoriented() {
        let mut tree = SiteTree::new();
        let mut input = rect(0.0, 0.0, 4.0, 3.0);
        input.reverse();
        tree.add_root(Site::area("room", input, Vec::new()));
        let result = compile(&tree);
        assert!(result.floorplan.walls[0].counter_clockwise);
        assert_eq!(
            rotate_to_canonical_start(&result.floorplan.walls[0].points),
            rect(0.0, 0.0, 4.0, 3.0)
        );
    }

    #[test]
    fn perimeter_is_preserved() {
        let mut tree = SiteTree::new();
        let outline = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(5.0, 2.0),
            Point2::new(2.5, 4.0),
            Point2::new(0.0, 2.0),
        ];
        let perimeter: f64 = (0..5).map(|i| (outline[(i + 1) % 5] - outline[i]).norm()).sum();
        tree.add_root(Site::space("hall", outline));
        let result = compile(&tree);
        assert_relative_eq!(result.arrangement.total_edge_length(), perimeter, epsilon = 1e-9);
    }

    #[test]
    fn transformed_children_land_in_place() {
        let mut tree = SiteTree::new();
        let root = tree.add_root(Site::space("plan", Vec::new()).with_transform(Transform::translation(10.0, 0.0)));
        tree.add_child(root, Site::area("room", rect(0.0, 0.0, 2.0, 1.0), Vec::new()))
            .unwrap();
        let result = compile(&tree);
        let filler = &result.floorplan.fillers[0];
        assert_eq!(rotate_to_canonical_start(filler), rect(10.0, 0.0, 12.0, 1.0));
    }

    #[test]
    fn flush_squares_share_a_doorstep() {
        init_tracing();
        let result = compile(&connected_pair(0.0));
        let arr = &result.arrangement;

        assert_eq!(result.doorsteps.len(), 2);
        assert_eq!(arr.doorstep_count(), 2);
        let (p, q) = (
            arr.source_point(result.doorsteps[0]).unwrap().to_point(),
            arr.target_point(result.doorsteps[0]).unwrap().to_point(),
        );
        assert!((p - Point2::new(1.0, 0.3)).norm() < 1e-9);
        assert!((q - Point2::new(1.0, 0.7)).norm() < 1e-9);

        assert_eq!(result.floor_faces.len(), 2);
        assert!(result.filler_faces.is_empty());
        for &h in &result.doorsteps {
            assert!(result.floor_faces.contains(&arr.incident_face(h).unwrap()));
        }
        assert_ne!(
            arr.incident_face(result.doorsteps[0]).unwrap(),
            arr.incident_face(result.doorsteps[1]).unwrap()
        );

        // One wall around both rooms.
        let walls = &result.floorplan.walls;
        assert_eq!(walls.len(), 1);
        assert!(walls[0].counter_clockwise);
        assert_relative_eq!(signed_area_2d(&walls[0].points), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn touching_rooms_with_unequal_markers() {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 1.0, 1.0), vec![marker(1)]));
        let b = tree.add_root(Site::area("b", rect(1.0, 0.0, 2.0, 1.0), vec![BoundaryMarker::new(
            3,
            0.5,
            0.6,
            BoundaryKind::Exterior,
        )]));
        tree.add_root(Site::connection("door", MarkerRef::new(a, 0), MarkerRef::new(b, 0)));
        let result = compile(&tree);
        assert_eq!(result.doorsteps.len(), 2);
        assert_eq!(result.floor_faces.len(), 2);
        assert_eq!(result.floorplan.walls.len(), 1);
        assert_relative_eq!(signed_area_2d(&result.floorplan.walls[0].points), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn non_finite_marker_fails_instead_of_hanging() {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 1.0, 1.0), vec![BoundaryMarker::new(
            1,
            0.5,
            f64::NAN,
            BoundaryKind::Exterior,
        )]));
        let b = tree.add_root(Site::area("b", rect(1.0, 0.0, 2.0, 1.0), vec![marker(3)]));
        tree.add_root(Site::connection("door", MarkerRef::new(a, 0), MarkerRef::new(b, 0)));
        let err = compile_with(&tree, CompileConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            FloorplanError::Geometry(crate::error::GeometryError::NonFinite { .. })
        ));
    }

    #[test]
    fn bridged_squares_close_per_room() {
        let result = compile(&connected_pair(0.2));
        assert_eq!(result.doorsteps.len(), 2);
        assert_eq!(result.floor_faces.len(), 2);
        // The 0.4 wide opening is within the stitch tolerance, so each
        // room's section closes on itself.
        assert_eq!(result.floorplan.walls.len(), 2);
        assert_eq!(result.floorplan.contours.len(), 2);
    }

    #[test]
    fn bridged_squares_merge_with_tight_tolerance() {
        let config = CompileConfig {
            max_connection_length: 0.3,
            ..CompileConfig::default()
        };
        let result = compile_with(&connected_pair(0.2), config).unwrap();
        let walls = &result.floorplan.walls;
        assert_eq!(walls.len(), 1);
        assert_eq!(walls[0].points.len(), 12);
        assert!(walls[0].counter_clockwise);
    }

    #[test]
    fn stitch_gap_wider_than_tolerance_fails() {
        let config = CompileConfig {
            max_connection_length: 0.1,
            ..CompileConfig::default()
        };
        let err = compile_with(&connected_pair(0.2), config).unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::NoProgress(_))));
    }

    #[test]
    fn disabled_passes_are_skipped() {
        let config = CompileConfig {
            passes: Passes {
                connections: false,
                walls: false,
            },
            ..CompileConfig::default()
        };
        let result = compile_with(&connected_pair(0.0), config).unwrap();
        assert!(result.doorsteps.is_empty());
        assert!(result.floor_faces.is_empty());
        assert_eq!(result.filler_faces.len(), 2);
        assert!(result.floorplan.walls.is_empty());
        assert!(result.floorplan.contours.is_empty());
    }

    #[test]
    fn faces_partition_into_floors_and_fillers() {
        let mut tree = connected_pair(0.0);
        tree.add_root(Site::object("cabinet", rect(5.0, 5.0, 6.0, 6.0)));
        let result = compile(&tree);
        assert_eq!(result.floor_faces.len(), 2);
        assert_eq!(result.filler_faces.len(), 1);
        assert!(result
            .floor_faces
            .iter()
            .all(|f| !result.filler_faces.contains(f)));
        assert_eq!(result.floorplan.floors.len(), 2);
        assert_eq!(result.floorplan.fillers.len(), 1);
    }

    #[test]
    fn column_inside_room_nests_as_one_hole() {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 10.0, 10.0), vec![BoundaryMarker::new(
            1,
            5.0,
            2.0,
            BoundaryKind::Exterior,
        )]));
        let b = tree.add_root(Site::area("b", rect(10.0, 0.0, 20.0, 10.0), vec![BoundaryMarker::new(
            3,
            5.0,
            2.0,
            BoundaryKind::Exterior,
        )]));
        tree.add_root(Site::connection("door", MarkerRef::new(a, 0), MarkerRef::new(b, 0)));
        tree.add_child(a, Site::object("column", rect(4.0, 4.0, 6.0, 6.0))).unwrap();
        let result = compile(&tree);

        let floor_with_hole = result
            .floorplan
            .floors
            .iter()
            .find(|f| !f.holes.is_empty())
            .unwrap();
        assert_eq!(floor_with_hole.holes.len(), 1);
        assert!(signed_area_2d(&floor_with_hole.holes[0]) < 0.0);

        // The column ring is reached from the room side and again as its
        // own filler; only one wall is kept.
        assert_eq!(result.floorplan.walls.len(), 2);
        let contours = &result.floorplan.contours;
        assert_eq!(contours.len(), 1);
        assert_relative_eq!(signed_area_2d(&contours[0].outer), 200.0, epsilon = 1e-9);
        assert_eq!(contours[0].holes.len(), 1);
        assert_relative_eq!(signed_area_2d(&contours[0].holes[0]).abs(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn connection_on_one_area_fails() {
        let mut tree = SiteTree::new();
        let a = tree.add_root(Site::area("a", rect(0.0, 0.0, 1.0, 1.0), vec![marker(1), marker(3)]));
        tree.add_root(Site::connection("loop", MarkerRef::new(a, 0), MarkerRef::new(a, 1)));
        let err = compile_with(&tree, CompileConfig::default()).unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::ConnectionFailed(_))));
        assert!(err.to_string().starts_with("Failed to construct connection"));
    }

    #[test]
    fn dangling_marker_reference_fails() {
        let mut tree = connected_pair(0.0);
        let a = tree.roots()[0];
        let b = tree.roots()[1];
        tree.add_root(Site::connection("ghost", MarkerRef::new(a, 7), MarkerRef::new(b, 0)));
        let err = compile_with(&tree, CompileConfig::default()).unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::InvalidSite(_))));
    }

    #[test]
    fn lost_doorstep_is_detected() {
        let tree = connected_pair(0.0);
        let mut result = compile(&tree);
        let h = result.doorsteps[0];
        result.arrangement.remove_edge(h).unwrap();
        let err = verify_doorsteps(&result.arrangement, &result.doorsteps).unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::DoorstepLost(_))));
        assert!(err.to_string().starts_with("Doorstep lost"));
    }

    #[test]
    fn doorsteps_survive_later_connections() {
        let mut tree = connected_pair(0.0);
        let c = tree.add_root(Site::area("c", rect(0.0, 5.0, 1.0, 6.0), vec![marker(1)]));
        let d = tree.add_root(Site::area("d", rect(1.2, 5.0, 2.2, 6.0), vec![marker(3)]));
        tree.add_root(Site::connection("arch", MarkerRef::new(c, 0), MarkerRef::new(d, 0)));
        let result = compile(&tree);
        assert_eq!(result.doorsteps.len(), 4);
        assert!(result.doorsteps.iter().all(|&h| result.arrangement.is_doorstep(h)));
        assert_eq!(result.arrangement.doorstep_count(), 4);
        assert_eq!(result.floor_faces.len(), 4);
    }

    #[test]
    fn persisted_floorplan_reads_back() {
        let result = compile(&connected_pair(0.0));
        let text = result.floorplan.to_text();
        let restored = Floorplan::from_text(&text).unwrap();
        assert_eq!(restored.floors, result.floorplan.floors);
        assert_eq!(restored.walls, result.floorplan.walls);
        assert!(restored.contours.is_empty());
    }

    #[test]
    fn floors_tessellate() {
        let result = compile(&connected_pair(0.0));
        let area: f64 = result
            .floorplan
            .floors
            .iter()
            .map(|f| crate::tessellation::TessellateFloor::new(f).execute().unwrap().area())
            .sum();
        assert_relative_eq!(area, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn drag_deltas_snap_to_the_grid() {
        assert_eq!(snap_delta(Vector2::new(2.4, 2.6)), (2, 3));
        assert_eq!(snap_delta(Vector2::new(-2.5, 0.5)), (-2, 1));
        assert!(TOLERANCE > 0.0);
    }
}
