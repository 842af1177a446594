use nalgebra::Matrix2;
use num_bigint::BigInt;

use super::exact::{ExactPoint, Scalar};
use super::Vector2;
use crate::error::GeometryError;

/// Rotation by a multiple of 90 degrees, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuarterTurn {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl QuarterTurn {
    fn matrix(self) -> Matrix2<i32> {
        match self {
            Self::R0 => Matrix2::new(1, 0, 0, 1),
            Self::R90 => Matrix2::new(0, -1, 1, 0),
            Self::R180 => Matrix2::new(-1, 0, 0, -1),
            Self::R270 => Matrix2::new(0, 1, -1, 0),
        }
    }
}

/// Placement of a site relative to its parent.
///
/// Applied as mirror, then rotation, then translation. The two mirror flags
/// and four rotations give the eight axis-aligned orientations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translation: Vector2,
    pub rotation: QuarterTurn,
    /// Negates x before rotating.
    pub mirror_x: bool,
    /// Negates y before rotating.
    pub mirror_y: bool,
}

impl Transform {
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            translation: Vector2::new(x, y),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: QuarterTurn) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_mirror(mut self, mirror_x: bool, mirror_y: bool) -> Self {
        self.mirror_x = mirror_x;
        self.mirror_y = mirror_y;
        self
    }

    /// Integer matrix of the mirror and rotation parts.
    #[must_use]
    pub fn linear(&self) -> Matrix2<i32> {
        let mirror = Matrix2::new(
            if self.mirror_x { -1 } else { 1 },
            0,
            0,
            if self.mirror_y { -1 } else { 1 },
        );
        self.rotation.matrix() * mirror
    }
}

/// Exact absolute transform: integer linear part plus rational translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactTransform {
    pub linear: Matrix2<i32>,
    pub translation: ExactPoint,
}

impl ExactTransform {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            linear: Matrix2::identity(),
            translation: ExactPoint::from_integers(0, 0),
        }
    }

    /// Converts a local transform.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::NonFinite` if the translation is not finite.
    pub fn from_transform(t: &Transform) -> Result<Self, GeometryError> {
        Ok(Self {
            linear: t.linear(),
            translation: ExactPoint::from_f64(t.translation.x, t.translation.y)?,
        })
    }

    /// Composes `self` (the parent) with `child`: the result applies
    /// `child` first.
    #[must_use]
    pub fn then(&self, child: &Self) -> Self {
        let moved = self.apply(&child.translation);
        Self {
            linear: self.linear * child.linear,
            translation: moved,
        }
    }

    #[must_use]
    pub fn apply(&self, p: &ExactPoint) -> ExactPoint {
        let m = &self.linear;
        let c = |v: i32| Scalar::from_integer(BigInt::from(v));
        ExactPoint::new(
            c(m[(0, 0)]) * &p.x + c(m[(0, 1)]) * &p.y + &self.translation.x,
            c(m[(1, 0)]) * &p.x + c(m[(1, 1)]) * &p.y + &self.translation.y,
        )
    }
}
