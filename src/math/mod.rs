pub mod distance_2d;
pub mod exact;
pub mod polygon_2d;
pub mod transform;

pub use exact::{ExactPoint, Scalar};
pub use transform::{ExactTransform, QuarterTurn, Transform};

/// 2D point type used at the output boundary.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Rounds a drag delta to whole grid units.
///
/// Each component becomes `floor(0.5 + v)`, so halves round towards
/// positive infinity: `(2.4, 2.6) -> (2, 3)` and `(-2.5, 0.5) -> (-2, 1)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn snap_delta(delta: Vector2) -> (i64, i64) {
    let snap = |v: f64| (0.5 + v).floor() as i64;
    (snap(delta.x), snap(delta.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_half_up() {
        assert_eq!(snap_delta(Vector2::new(2.4, 2.6)), (2, 3));
        assert_eq!(snap_delta(Vector2::new(-2.5, 0.5)), (-2, 1));
        assert_eq!(snap_delta(Vector2::new(-0.4, -0.6)), (0, -1));
    }

    #[test]
    fn snap_keeps_integers() {
        assert_eq!(snap_delta(Vector2::new(7.0, -3.0)), (7, -3));
    }
}
