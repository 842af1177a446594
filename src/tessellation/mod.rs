//! Triangulation of floor polygons for renderers.

mod tessellate_floor;

pub use tessellate_floor::TessellateFloor;

use crate::math::Point2;

/// A planar triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct FloorMesh {
    /// Vertex positions in plan coordinates.
    pub vertices: Vec<Point2>,
    /// Triangle indices, counter-clockwise.
    pub indices: Vec<[u32; 3]>,
}

impl FloorMesh {
    /// Sum of the triangle areas.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.indices
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (
                    self.vertices[a as usize],
                    self.vertices[b as usize],
                    self.vertices[c as usize],
                );
                ((b - a).perp(&(c - a))) * 0.5
            })
            .sum()
    }
}
