use crate::site::SiteId;

use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a half-edge in the arrangement.
    pub struct HalfEdgeId;
}

/// One oriented side of an arrangement edge.
///
/// The face a half-edge bounds lies on its left.
#[derive(Debug, Clone)]
pub struct HalfEdgeData {
    /// Vertex the half-edge starts at.
    pub origin: VertexId,
    /// The oppositely oriented half-edge of the same edge.
    pub twin: HalfEdgeId,
    /// Next half-edge around the incident face.
    pub next: HalfEdgeId,
    /// Previous half-edge around the incident face.
    pub prev: HalfEdgeId,
    /// Incident face, set by `Arrangement::rebuild_faces`.
    pub face: Option<FaceId>,
    /// Exactly one half-edge of each pair is primary; edge iteration visits
    /// primaries only.
    pub primary: bool,
}

/// Doorstep tag stored in the arrangement's side-table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doorstep {
    /// The area on the left side of the tagged half-edge.
    pub area: SiteId,
}
