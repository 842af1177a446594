//! Boundary markers: segments of an area contour that may carry a
//! connection.

use num_traits::Zero;

use crate::error::{GeometryError, Result};
use crate::math::exact::signed_area_twice;
use crate::math::{ExactPoint, ExactTransform, Point2, Scalar, TOLERANCE};

/// Whether a marker faces the outside of the floorplan or another room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryKind {
    #[default]
    Interior,
    Exterior,
}

/// Which of the three marker points to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    /// `width / 2` backward along the contour from the mid point.
    Left,
    Mid,
    /// `width / 2` forward along the contour from the mid point.
    Right,
}

/// A point on a contour, located by edge and distance along that edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryPoint {
    pub edge_index: usize,
    pub point: Point2,
    pub offset: f64,
}

/// A segment of an area's contour centred at `offset` along edge
/// `edge_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryMarker {
    pub edge_index: usize,
    pub offset: f64,
    pub width: f64,
    pub kind: BoundaryKind,
}

impl BoundaryMarker {
    #[must_use]
    pub fn new(edge_index: usize, offset: f64, width: f64, kind: BoundaryKind) -> Self {
        Self {
            edge_index,
            offset,
            width,
            kind,
        }
    }

    /// Evaluates one of the marker points on the local `contour`.
    ///
    /// Returns `None` if the contour has no length, `edge_index` is out of
    /// range, or the marker or contour is not finite.
    #[must_use]
    pub fn boundary_point(&self, contour: &[Point2], side: BoundarySide) -> Option<BoundaryPoint> {
        let (edge_index, offset) = self.locate(contour, side).ok()?;
        let n = contour.len();
        let a = contour[edge_index];
        let b = contour[(edge_index + 1) % n];
        let len = (b - a).norm();
        let point = if len < TOLERANCE {
            a
        } else {
            a + (b - a) * (offset / len)
        };
        Some(BoundaryPoint {
            edge_index,
            point,
            offset,
        })
    }

    /// Exact absolute position of one of the marker points.
    ///
    /// The point is interpolated on the exact contour edge, so it lies
    /// exactly on the segment the builder inserts for that edge.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if the marker cannot be placed on
    /// the contour, or `NonFinite` for a non-finite width, offset or
    /// coordinate.
    pub fn exact_point(
        &self,
        contour: &[Point2],
        transform: &ExactTransform,
        side: BoundarySide,
    ) -> Result<ExactPoint> {
        let (edge_index, offset) = self.locate(contour, side)?;
        let n = contour.len();
        let a = contour[edge_index];
        let b = contour[(edge_index + 1) % n];
        let len = (b - a).norm();
        let t = if len < TOLERANCE { 0.0 } else { (offset / len).clamp(0.0, 1.0) };
        let t = Scalar::from_float(t).ok_or(GeometryError::NonFinite { x: offset, y: len })?;
        let ea = ExactPoint::from_point(&a)?;
        let eb = ExactPoint::from_point(&b)?;
        Ok(transform.apply(&ea.lerp(&eb, &t)))
    }

    /// Exact absolute points from the left to the right end of the marker,
    /// with every contour corner it wraps around in between.
    ///
    /// # Errors
    ///
    /// Same as [`BoundaryMarker::exact_point`].
    pub fn exact_path(&self, contour: &[Point2], transform: &ExactTransform) -> Result<Vec<ExactPoint>> {
        let (left_edge, _) = self.locate(contour, BoundarySide::Left)?;
        let (right_edge, _) = self.locate(contour, BoundarySide::Right)?;
        let n = contour.len();
        let mut path = vec![self.exact_point(contour, transform, BoundarySide::Left)?];
        let mut edge = left_edge;
        while edge != right_edge {
            edge = (edge + 1) % n;
            let corner = transform.apply(&ExactPoint::from_point(&contour[edge])?);
            if path.last() != Some(&corner) {
                path.push(corner);
            }
        }
        let right = self.exact_point(contour, transform, BoundarySide::Right)?;
        if path.last() != Some(&right) {
            path.push(right);
        }
        Ok(path)
    }

    /// Exact inward normal of the marker's edge in absolute coordinates
    /// (not normalised).
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range edge or non-finite coordinates.
    pub fn inward_normal(
        &self,
        contour: &[Point2],
        transform: &ExactTransform,
    ) -> Result<(Scalar, Scalar)> {
        let n = contour.len();
        if self.edge_index >= n {
            return Err(GeometryError::Degenerate("marker edge out of range".into()).into());
        }
        let ring: Vec<ExactPoint> = contour
            .iter()
            .map(|p| Ok(transform.apply(&ExactPoint::from_point(p)?)))
            .collect::<Result<_>>()?;
        let a = &ring[self.edge_index];
        let b = &ring[(self.edge_index + 1) % n];
        let dx = &b.x - &a.x;
        let dy = &b.y - &a.y;
        if signed_area_twice(&ring) > Scalar::zero() {
            Ok((-dy, dx))
        } else {
            Ok((dy, -dx))
        }
    }

    /// Walks from the mid point to the requested side and returns the edge
    /// index and the distance along that edge. Widths beyond the perimeter
    /// wrap around the contour.
    fn locate(&self, contour: &[Point2], side: BoundarySide) -> std::result::Result<(usize, f64), GeometryError> {
        if !self.offset.is_finite() || !self.width.is_finite() {
            return Err(GeometryError::NonFinite {
                x: self.offset,
                y: self.width,
            });
        }
        let n = contour.len();
        if n < 2 || self.edge_index >= n {
            return Err(GeometryError::Degenerate("marker outside its contour".into()));
        }
        let lengths: Vec<f64> = (0..n)
            .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
            .collect();
        let perimeter: f64 = lengths.iter().sum();
        if !perimeter.is_finite() {
            return Err(GeometryError::NonFinite { x: perimeter, y: 0.0 });
        }
        if perimeter < TOLERANCE {
            return Err(GeometryError::Degenerate("contour has no length".into()));
        }

        let mut index = self.edge_index;
        let mut offset = self.offset.clamp(0.0, lengths[index]);
        let mut distance = (self.width.abs() * 0.5) % perimeter;
        match side {
            BoundarySide::Mid => {}
            BoundarySide::Right => loop {
                let remaining = lengths[index] - offset;
                if distance <= remaining {
                    offset += distance;
                    break;
                }
                distance -= remaining;
                index = (index + 1) % n;
                offset = 0.0;
            },
            BoundarySide::Left => loop {
                if distance <= offset {
                    offset -= distance;
                    break;
                }
                distance -= offset;
                index = (index + n - 1) % n;
                offset = lengths[index];
            },
        }
        Ok((index, offset))
    }
}
