//! Compilation results consumed by renderers and exporters.

mod html;
mod persist;

pub use html::{debug_html, HtmlOptions};

use crate::arrangement::{Arrangement, FaceId, HalfEdgeId};
use crate::math::Point2;

/// A closed ring of points without a repeated closing point.
pub type Polygon = Vec<Point2>;

/// An outer ring plus any number of hole rings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonWithHoles {
    pub outer: Polygon,
    pub holes: Vec<Polygon>,
}

impl PolygonWithHoles {
    #[must_use]
    pub fn new(outer: Polygon, holes: Vec<Polygon>) -> Self {
        Self { outer, holes }
    }
}

/// One wall polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub closed: bool,
    pub counter_clockwise: bool,
    pub points: Vec<Point2>,
}

/// A connected wall polygon: one outer loop and the loops nested inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contour {
    pub outer: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

/// Floor, filler and wall geometry of a compiled site tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Floorplan {
    pub floors: Vec<PolygonWithHoles>,
    pub fillers: Vec<Polygon>,
    pub walls: Vec<Wall>,
    /// Derived from `walls`; not persisted.
    pub contours: Vec<Contour>,
}

/// Everything a compilation run produces.
#[derive(Debug)]
pub struct Compilation {
    pub arrangement: Arrangement,
    pub floor_faces: Vec<FaceId>,
    pub filler_faces: Vec<FaceId>,
    /// Both half-edges of every resolved doorstep.
    pub doorsteps: Vec<HalfEdgeId>,
    pub floorplan: Floorplan,
}
