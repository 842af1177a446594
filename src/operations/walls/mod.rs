//! Wall geometry: extraction of wall sections from face boundaries,
//! stitching of open sections into loops, and nesting of loops into
//! contours.

mod extract;
mod nest;
mod stitch;

pub use extract::ExtractWalls;
pub use nest::NestContours;
pub use stitch::{flatten_loop, StitchSections};

use crate::math::polygon_2d::Orientation;
use crate::math::Point2;

/// A chain of boundary points taken from one face boundary.
///
/// Open sections run between two doorsteps; a boundary without doorsteps
/// yields one closed section.
#[derive(Debug, Clone, PartialEq)]
pub struct WallSection {
    pub points: Vec<Point2>,
    /// Winding of the boundary the section came from: counter-clockwise for
    /// outer boundaries, clockwise for holes.
    pub orientation: Orientation,
    pub closed: bool,
    /// Position of the section among the doorstep gaps of its boundary.
    pub index: usize,
}

impl WallSection {
    #[must_use]
    pub fn open(points: Vec<Point2>, orientation: Orientation, index: usize) -> Self {
        Self {
            points,
            orientation,
            closed: false,
            index,
        }
    }

    #[must_use]
    pub fn closed(points: Vec<Point2>, orientation: Orientation) -> Self {
        Self {
            points,
            orientation,
            closed: true,
            index: 0,
        }
    }

    #[must_use]
    pub fn front(&self) -> Option<&Point2> {
        self.points.first()
    }

    #[must_use]
    pub fn back(&self) -> Option<&Point2> {
        self.points.last()
    }
}
