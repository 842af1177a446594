use super::distance_2d::point_to_ring_dist;
use super::{Point2, TOLERANCE};

/// Winding of a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    CounterClockwise,
    Clockwise,
}

impl Orientation {
    /// Orientation of a ring with the given signed area. Zero counts as
    /// counter-clockwise.
    #[must_use]
    pub fn from_signed_area(area: f64) -> Self {
        if area < 0.0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }
}

/// Computes the signed area of a closed ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the ring with its point order reversed if its winding differs
/// from `target`.
#[must_use]
pub fn reorient(points: &[Point2], target: Orientation) -> Vec<Point2> {
    let mut out = points.to_vec();
    if Orientation::from_signed_area(signed_area_2d(points)) != target {
        out.reverse();
    }
    out
}

/// Rotates a closed ring so it starts at the leftmost vertex (smallest x),
/// breaking ties by smallest y.
#[must_use]
pub fn rotate_to_canonical_start(points: &[Point2]) -> Vec<Point2> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let mut best = 0;
    for (i, pt) in points.iter().enumerate().skip(1) {
        let b = &points[best];
        if pt.x < b.x - TOLERANCE || (pt.x - b.x).abs() < TOLERANCE && pt.y < b.y {
            best = i;
        }
    }
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[best..]);
    rotated.extend_from_slice(&points[..best]);
    rotated
}

/// Removes consecutive points closer than `TOLERANCE`, including a closing
/// point that repeats the first one.
#[must_use]
pub fn dedup_ring(points: &[Point2]) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|last| (p - last).norm() >= TOLERANCE) {
            out.push(*p);
        }
    }
    while out.len() > 1 && (out[0] - out[out.len() - 1]).norm() < TOLERANCE {
        out.pop();
    }
    out
}

/// Even-odd point-in-polygon test.
///
/// A point within `TOLERANCE` of the boundary counts as outside.
#[must_use]
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    if point_to_ring_dist(p, polygon) < TOLERANCE {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
