use crate::math::ExactPoint;

use super::half_edge::HalfEdgeId;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the arrangement.
    pub struct VertexId;
}

/// Data associated with an arrangement vertex.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The exact position of the vertex.
    pub point: ExactPoint,
    /// Outgoing half-edges, sorted counter-clockwise by direction.
    pub outgoing: Vec<HalfEdgeId>,
}

impl VertexData {
    /// Creates an isolated vertex at the given point.
    #[must_use]
    pub fn new(point: ExactPoint) -> Self {
        Self {
            point,
            outgoing: Vec::new(),
        }
    }
}
