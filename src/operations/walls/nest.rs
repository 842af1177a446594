use tracing::debug;

use crate::error::{CompileError, Result};
use crate::math::polygon_2d::point_in_polygon;
use crate::math::Point2;
use crate::output::Contour;

/// Groups closed wall loops into contours by pairwise containment of each
/// loop's first point.
///
/// A loop inside exactly one other loop becomes a hole of that loop; a loop
/// inside nothing starts a new contour.
#[derive(Debug)]
pub struct NestContours<'a> {
    loops: &'a [Vec<Point2>],
}

impl<'a> NestContours<'a> {
    #[must_use]
    pub fn new(loops: &'a [Vec<Point2>]) -> Self {
        Self { loops }
    }

    /// Executes the nesting. Contours keep the order of their outer loops.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::OverlappingPolygons` if two loops contain each
    /// other, a loop lies inside two or more loops, or a hole's container is
    /// itself a hole.
    pub fn execute(&self) -> Result<Vec<Contour>> {
        let n = self.loops.len();
        let mut parent: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let Some(first) = self.loops[i].first() else {
                continue;
            };
            let containers: Vec<usize> = (0..n)
                .filter(|&j| j != i && point_in_polygon(first, &self.loops[j]))
                .collect();
            match containers.as_slice() {
                [] => {}
                [j] => parent[i] = Some(*j),
                _ => {
                    return Err(overlapping(format!(
                        "loop {i} lies inside {} loops",
                        containers.len()
                    )))
                }
            }
        }

        for i in 0..n {
            if let Some(j) = parent[i] {
                if parent[j] == Some(i) {
                    return Err(overlapping(format!("loops {i} and {j} contain each other")));
                }
                if parent[j].is_some() {
                    return Err(overlapping(format!("loop {i} lies inside hole {j}")));
                }
            }
        }

        let mut slot: Vec<Option<usize>> = vec![None; n];
        let mut contours = Vec::new();
        for i in (0..n).filter(|&i| parent[i].is_none() && !self.loops[i].is_empty()) {
            slot[i] = Some(contours.len());
            contours.push(Contour {
                outer: self.loops[i].clone(),
                holes: Vec::new(),
            });
        }
        for i in 0..n {
            if let Some(k) = parent[i].and_then(|j| slot[j]) {
                contours[k].holes.push(self.loops[i].clone());
            }
        }

        debug!(loops = n, contours = contours.len(), "nested wall loops");
        Ok(contours)
    }
}

fn overlapping(message: String) -> crate::error::FloorplanError {
    CompileError::OverlappingPolygons(message).into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FloorplanError;

    fn ring(coords: &[(f64, f64)]) -> Vec<Point2> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2> {
        ring(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    #[test]
    fn inner_ring_becomes_hole() {
        let loops = vec![square(0.0, 0.0, 10.0), square(2.0, 2.0, 2.0), square(20.0, 0.0, 1.0)];
        let contours = NestContours::new(&loops).execute().unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].outer, loops[0]);
        assert_eq!(contours[0].holes, vec![loops[1].clone()]);
        assert_eq!(contours[1].outer, loops[2]);
        assert!(contours[1].holes.is_empty());
    }

    #[test]
    fn hole_listed_before_outer() {
        let loops = vec![square(2.0, 2.0, 2.0), square(0.0, 0.0, 10.0)];
        let contours = NestContours::new(&loops).execute().unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].outer, loops[1]);
        assert_eq!(contours[0].holes.len(), 1);
    }

    #[test]
    fn touching_rings_are_separate() {
        let loops = vec![square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)];
        let contours = NestContours::new(&loops).execute().unwrap();
        assert_eq!(contours.len(), 2);
    }

    #[test]
    fn mutual_containment_fails() {
        let a = ring(&[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
        let b = ring(&[(2.0, 2.0), (0.0, 2.0), (0.0, 0.0), (2.0, 0.0)]);
        let err = NestContours::new(&[a, b]).execute().unwrap_err();
        assert!(matches!(err, FloorplanError::Compile(CompileError::OverlappingPolygons(_))));
        assert!(err.to_string().starts_with("Overlapping polygons"));
    }

    #[test]
    fn double_containment_fails() {
        let loops = vec![square(0.0, 0.0, 10.0), square(1.0, 1.0, 8.0), square(4.0, 4.0, 1.0)];
        let err = NestContours::new(&loops).execute().unwrap_err();
        assert!(err.to_string().contains("inside 2 loops"));
    }
}
