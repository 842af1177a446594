//! Exact rational 2D kernel.
//!
//! Every predicate and construction used by the arrangement runs on
//! [`ExactPoint`]s with arbitrary-precision rational coordinates, so
//! intersection points, midpoints and containment tests never round.
//! Conversion to `f64` happens only at the output boundary.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use super::Point2;
use crate::error::GeometryError;

/// Exact rational scalar.
pub type Scalar = BigRational;

/// A point with exact rational coordinates.
///
/// Ordering is lexicographic (x first, then y).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExactPoint {
    pub x: Scalar,
    pub y: Scalar,
}

impl ExactPoint {
    /// Creates a point from two rationals.
    #[must_use]
    pub fn new(x: Scalar, y: Scalar) -> Self {
        Self { x, y }
    }

    /// Creates a point with integer coordinates.
    #[must_use]
    pub fn from_integers(x: i64, y: i64) -> Self {
        Self::new(
            Scalar::from_integer(BigInt::from(x)),
            Scalar::from_integer(BigInt::from(y)),
        )
    }

    /// Converts finite floating-point coordinates without rounding.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for NaN or infinite input.
    pub fn from_f64(x: f64, y: f64) -> Result<Self, GeometryError> {
        match (Scalar::from_float(x), Scalar::from_float(y)) {
            (Some(ex), Some(ey)) => Ok(Self::new(ex, ey)),
            _ => Err(GeometryError::NonFinite { x, y }),
        }
    }

    /// Converts a floating-point point without rounding.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` for NaN or infinite input.
    pub fn from_point(p: &Point2) -> Result<Self, GeometryError> {
        Self::from_f64(p.x, p.y)
    }

    /// Returns the nearest floating-point point.
    #[must_use]
    pub fn to_point(&self) -> Point2 {
        Point2::new(to_f64(&self.x), to_f64(&self.y))
    }

    /// Returns `self + (other - self) * t`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: &Scalar) -> Self {
        Self::new(
            &self.x + (&other.x - &self.x) * t,
            &self.y + (&other.y - &self.y) * t,
        )
    }

    /// Returns the exact midpoint of `self` and `other`.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        self.lerp(other, &Scalar::new(BigInt::from(1), BigInt::from(2)))
    }
}

/// Converts a rational to the nearest representable `f64`.
#[must_use]
pub fn to_f64(value: &Scalar) -> f64 {
    let numer = value.numer().to_f64().unwrap_or(f64::NAN);
    let denom = value.denom().to_f64().unwrap_or(f64::NAN);
    numer / denom
}

fn sub(a: &ExactPoint, b: &ExactPoint) -> (Scalar, Scalar) {
    (&a.x - &b.x, &a.y - &b.y)
}

/// Cross product of `a - o` and `b - o`.
#[must_use]
pub fn cross(o: &ExactPoint, a: &ExactPoint, b: &ExactPoint) -> Scalar {
    let (ax, ay) = sub(a, o);
    let (bx, by) = sub(b, o);
    ax * by - ay * bx
}

/// Orientation of `c` relative to the directed line `a -> b`.
///
/// `Greater` = left turn (counter-clockwise), `Less` = right turn,
/// `Equal` = collinear.
#[must_use]
pub fn orientation(a: &ExactPoint, b: &ExactPoint, c: &ExactPoint) -> Ordering {
    cross(a, b, c).cmp(&Scalar::zero())
}

/// Dot product of `p - a` and `b - a`; orders points along `a -> b`.
#[must_use]
pub fn dot_along(a: &ExactPoint, b: &ExactPoint, p: &ExactPoint) -> Scalar {
    let (dx, dy) = sub(b, a);
    let (px, py) = sub(p, a);
    px * dx + py * dy
}

/// Squared distance between two points.
#[must_use]
pub fn squared_distance(a: &ExactPoint, b: &ExactPoint) -> Scalar {
    let (dx, dy) = sub(b, a);
    &dx * &dx + &dy * &dy
}

/// Returns `true` if `p` lies on the closed segment `[a, b]`.
#[must_use]
pub fn on_segment(p: &ExactPoint, a: &ExactPoint, b: &ExactPoint) -> bool {
    if orientation(a, b, p) != Ordering::Equal {
        return false;
    }
    let t = dot_along(a, b, p);
    t >= Scalar::zero() && t <= squared_distance(a, b)
}

/// Compares the directions `a - origin` and `b - origin` by polar angle in
/// `[0, 2pi)`, measured counter-clockwise from the positive x axis.
#[must_use]
pub fn compare_direction(origin: &ExactPoint, a: &ExactPoint, b: &ExactPoint) -> Ordering {
    let (ax, ay) = sub(a, origin);
    let (bx, by) = sub(b, origin);
    half_plane(&ax, &ay)
        .cmp(&half_plane(&bx, &by))
        .then_with(|| Scalar::zero().cmp(&(ax * by - ay * bx)))
}

fn half_plane(x: &Scalar, y: &Scalar) -> u8 {
    let zero = Scalar::zero();
    if *y > zero || (y.is_zero() && *x > zero) {
        0
    } else {
        1
    }
}

/// Result of intersecting two closed segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentIntersection {
    /// The segments do not meet.
    Disjoint,
    /// The segments meet in exactly one point.
    Point(ExactPoint),
    /// The segments are collinear and share the sub-segment between the two
    /// points, ordered along the first segment.
    Overlap(ExactPoint, ExactPoint),
}

/// Exact intersection of the closed segments `[a0, a1]` and `[b0, b1]`.
///
/// Both segments must have non-zero length.
#[must_use]
pub fn intersect_segments(
    a0: &ExactPoint,
    a1: &ExactPoint,
    b0: &ExactPoint,
    b1: &ExactPoint,
) -> SegmentIntersection {
    let d1 = orientation(b0, b1, a0);
    let d2 = orientation(b0, b1, a1);
    let d3 = orientation(a0, a1, b0);
    let d4 = orientation(a0, a1, b1);

    if [d1, d2, d3, d4].iter().all(|d| *d == Ordering::Equal) {
        return collinear_overlap(a0, a1, b0, b1);
    }

    if !(straddles(d1, d2) && straddles(d3, d4)) {
        return SegmentIntersection::Disjoint;
    }

    let (ax, ay) = sub(a1, a0);
    let (bx, by) = sub(b1, b0);
    let denom = &ax * &by - &ay * &bx;
    if denom.is_zero() {
        return SegmentIntersection::Disjoint;
    }
    let (wx, wy) = sub(b0, a0);
    let t = (wx * &by - wy * &bx) / denom;
    SegmentIntersection::Point(a0.lerp(a1, &t))
}

fn straddles(p: Ordering, q: Ordering) -> bool {
    p == Ordering::Equal || q == Ordering::Equal || p != q
}

fn collinear_overlap(
    a0: &ExactPoint,
    a1: &ExactPoint,
    b0: &ExactPoint,
    b1: &ExactPoint,
) -> SegmentIntersection {
    let len_sq = squared_distance(a0, a1);
    if len_sq.is_zero() {
        return SegmentIntersection::Disjoint;
    }
    let tb0 = dot_along(a0, a1, b0) / &len_sq;
    let tb1 = dot_along(a0, a1, b1) / &len_sq;
    let (b_lo, b_hi) = if tb0 <= tb1 { (tb0, tb1) } else { (tb1, tb0) };

    let zero = Scalar::zero();
    let one = Scalar::from_integer(BigInt::from(1));
    let lo = if b_lo > zero { b_lo } else { zero };
    let hi = if b_hi < one { b_hi } else { one };

    match lo.cmp(&hi) {
        Ordering::Greater => SegmentIntersection::Disjoint,
        Ordering::Equal => SegmentIntersection::Point(a0.lerp(a1, &lo)),
        Ordering::Less => SegmentIntersection::Overlap(a0.lerp(a1, &lo), a0.lerp(a1, &hi)),
    }
}

/// Sorts points lying on the segment `a -> b` by their position along it
/// and removes duplicates.
#[must_use]
pub fn sort_along(a: &ExactPoint, b: &ExactPoint, points: Vec<ExactPoint>) -> Vec<ExactPoint> {
    let mut keyed: Vec<(Scalar, ExactPoint)> = points
        .into_iter()
        .map(|p| (dot_along(a, b, &p), p))
        .collect();
    keyed.sort_by(|l, r| l.0.cmp(&r.0));
    keyed.dedup_by(|l, r| l.0 == r.0);
    keyed.into_iter().map(|(_, p)| p).collect()
}

/// Twice the signed area of a closed ring (shoelace formula).
///
/// Positive for counter-clockwise rings, negative for clockwise ones.
#[must_use]
pub fn signed_area_twice(ring: &[ExactPoint]) -> Scalar {
    let n = ring.len();
    let mut sum = Scalar::zero();
    if n < 3 {
        return sum;
    }
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        sum += &a.x * &b.y - &b.x * &a.y;
    }
    sum
}

/// Crossing-number containment test.
///
/// The result is only meaningful for points that do not lie on the ring.
#[must_use]
pub fn point_in_ring(p: &ExactPoint, ring: &[ExactPoint]) -> bool {
    let n = ring.len();
    let mut inside = false;
    for i in 0..n {
        let a = &ring[i];
        let b = &ring[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let o = orientation(a, b, p);
            let upward = b.y > a.y;
            if (upward && o == Ordering::Greater) || (!upward && o == Ordering::Less) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Returns `true` if the closed ring is simple: at least three vertices,
/// non-zero area, no zero-length edges and no edge meeting another edge
/// except adjacent edges at their shared vertex.
#[must_use]
pub fn is_simple_ring(ring: &[ExactPoint]) -> bool {
    let n = ring.len();
    if n < 3 || signed_area_twice(ring).is_zero() {
        return false;
    }
    if (0..n).any(|i| ring[i] == ring[(i + 1) % n]) {
        return false;
    }
    for i in 0..n {
        let (a0, a1) = (&ring[i], &ring[(i + 1) % n]);
        for j in (i + 1)..n {
            let (b0, b1) = (&ring[j], &ring[(j + 1) % n]);
            let shared = if j == i + 1 {
                Some(a1)
            } else if i == 0 && j == n - 1 {
                Some(a0)
            } else {
                None
            };
            match (intersect_segments(a0, a1, b0, b1), shared) {
                (SegmentIntersection::Disjoint, _) => {}
                (SegmentIntersection::Point(p), Some(s)) if &p == s => {}
                _ => return false,
            }
        }
    }
    true
}
