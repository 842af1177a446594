use num_traits::Zero;
use tracing::{debug, warn};

use crate::arrangement::{Arrangement, HalfEdgeId};
use crate::error::Result;
use crate::math::exact::signed_area_twice;
use crate::math::polygon_2d::Orientation;
use crate::math::{ExactPoint, ExactTransform, Point2, Scalar};
use crate::site::{SiteKind, SiteTree};

/// Inserts one polygon ring into the arrangement.
///
/// Every point is mapped through `transform`, the ring is reversed if its
/// winding differs from `target`, and each edge is inserted as a segment.
/// No self-intersection validation happens here.
#[derive(Debug)]
pub struct InsertPolygon<'a> {
    contour: &'a [Point2],
    transform: &'a ExactTransform,
    target: Orientation,
}

impl<'a> InsertPolygon<'a> {
    #[must_use]
    pub fn new(contour: &'a [Point2], transform: &'a ExactTransform, target: Orientation) -> Self {
        Self {
            contour,
            transform,
            target,
        }
    }

    /// Executes the insertion and returns every induced half-edge, in ring
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for non-finite coordinates.
    pub fn execute(&self, arrangement: &mut Arrangement) -> Result<Vec<HalfEdgeId>> {
        let mut ring = self
            .contour
            .iter()
            .map(|p| Ok(self.transform.apply(&ExactPoint::from_point(p)?)))
            .collect::<Result<Vec<_>>>()?;
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 2 {
            return Ok(Vec::new());
        }

        let area = signed_area_twice(&ring);
        let natural = if area < Scalar::zero() {
            Orientation::Clockwise
        } else {
            Orientation::CounterClockwise
        };
        if natural != self.target {
            ring.reverse();
        }

        let n = ring.len();
        let mut induced = Vec::with_capacity(n);
        for i in 0..n {
            induced.extend(arrangement.insert_segment(&ring[i], &ring[(i + 1) % n])?);
        }
        Ok(induced)
    }
}

/// Summary of an arrangement build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Inserts the contour of every area, space, object and wall of a site
/// tree, innermost sites first.
#[derive(Debug)]
pub struct BuildArrangement<'a> {
    tree: &'a SiteTree,
    target: Orientation,
}

impl<'a> BuildArrangement<'a> {
    #[must_use]
    pub fn new(tree: &'a SiteTree, target: Orientation) -> Self {
        Self { tree, target }
    }

    /// Executes the build.
    ///
    /// Empty, degenerate and self-intersecting contours are skipped with a
    /// warning; they appear transiently while a user is editing.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite coordinates or a broken site tree.
    pub fn execute(&self, arrangement: &mut Arrangement) -> Result<BuildReport> {
        let mut report = BuildReport::default();
        for id in self.tree.post_order() {
            let site = self.tree.site(id)?;
            if matches!(site.kind, SiteKind::Connection(_)) {
                continue;
            }
            if self.tree.simple_contour(id)?.is_none() {
                warn!(site = %site.name, "skipping contour that is empty or self-intersecting");
                report.skipped += 1;
                continue;
            }
            let transform = self.tree.absolute_transform(id)?;
            let contour = self.tree.contour(id)?;
            let induced = InsertPolygon::new(contour, &transform, self.target).execute(arrangement)?;
            debug!(site = %site.name, edges = induced.len(), "inserted contour");
            report.inserted += 1;
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Transform, TOLERANCE};
    use crate::site::Site;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn perimeter_is_preserved() {
        let mut arr = Arrangement::new();
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(1.5, 3.5),
            Point2::new(0.0, 2.0),
        ];
        let perimeter: f64 = (0..5)
            .map(|i| (contour[(i + 1) % 5] - contour[i]).norm())
            .sum();
        InsertPolygon::new(&contour, &ExactTransform::identity(), Orientation::CounterClockwise)
            .execute(&mut arr)
            .unwrap();
        assert!((arr.total_edge_length() - perimeter).abs() < 1e-9);
        assert_eq!(arr.edge_count(), 5);
    }

    #[test]
    fn ring_is_reoriented() {
        let mut arr = Arrangement::new();
        let mut contour = rect(0.0, 0.0, 1.0, 1.0);
        contour.reverse();
        let induced = InsertPolygon::new(&contour, &ExactTransform::identity(), Orientation::CounterClockwise)
            .execute(&mut arr)
            .unwrap();
        let ring = arr.cycle_points(induced[0]).unwrap();
        assert!(signed_area_twice(&ring) > Scalar::zero());
    }

    #[test]
    fn transform_is_applied() {
        let mut arr = Arrangement::new();
        let t = ExactTransform::from_transform(&Transform::translation(5.0, 0.0)).unwrap();
        InsertPolygon::new(&rect(0.0, 0.0, 1.0, 1.0), &t, Orientation::CounterClockwise)
            .execute(&mut arr)
            .unwrap();
        assert!(arr.vertex_at(&ExactPoint::from_integers(5, 0)).is_some());
        assert!(arr.vertex_at(&ExactPoint::from_integers(0, 0)).is_none());
    }

    #[test]
    fn build_skips_degenerate_contours() {
        let mut tree = SiteTree::new();
        let root = tree.add_root(Site::space("root", rect(0.0, 0.0, 4.0, 4.0)));
        tree.add_child(root, Site::area("a", rect(0.0, 0.0, 2.0, 2.0), Vec::new()))
            .unwrap();
        tree.add_child(root, Site::object("empty", Vec::new())).unwrap();
        tree.add_child(
            root,
            Site::wall(
                "bow tie",
                vec![
                    Point2::new(0.0, 0.0),
                    Point2::new(1.0, 1.0),
                    Point2::new(1.0, 0.0),
                    Point2::new(0.0, 1.0),
                ],
            ),
        )
        .unwrap();

        let mut arr = Arrangement::new();
        let report = BuildArrangement::new(&tree, Orientation::CounterClockwise)
            .execute(&mut arr)
            .unwrap();
        assert_eq!(report, BuildReport { inserted: 2, skipped: 2 });
        // Outer 16 plus the two inner sides of the area.
        assert!((arr.total_edge_length() - 20.0).abs() < TOLERANCE);
    }
}
