use slotmap::SlotMap;

use super::half_edge::{HalfEdgeData, HalfEdgeId};

slotmap::new_key_type! {
    /// Unique identifier for a face in the arrangement.
    pub struct FaceId;
}

/// Data associated with an arrangement face.
///
/// Bounded faces have an outer boundary cycle; the unbounded face has none.
/// Each hole is one half-edge of the outer cycle of a connected component
/// lying inside the face.
#[derive(Debug, Clone, Default)]
pub struct FaceData {
    pub outer: Option<HalfEdgeId>,
    pub holes: Vec<HalfEdgeId>,
}

impl FaceData {
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.outer.is_none()
    }

    /// Outer cycle (if any) followed by every hole cycle.
    pub fn cycles(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.outer.into_iter().chain(self.holes.iter().copied())
    }
}

/// Iterator over a connected component of the boundary: the half-edges of
/// one `next` cycle, starting at a given half-edge.
#[derive(Debug, Clone)]
pub struct Ccb<'a> {
    half_edges: &'a SlotMap<HalfEdgeId, HalfEdgeData>,
    start: HalfEdgeId,
    current: Option<HalfEdgeId>,
    remaining: usize,
}

impl<'a> Ccb<'a> {
    pub(crate) fn new(half_edges: &'a SlotMap<HalfEdgeId, HalfEdgeData>, start: HalfEdgeId) -> Self {
        Self {
            half_edges,
            start,
            current: Some(start),
            remaining: half_edges.len(),
        }
    }
}

impl Iterator for Ccb<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let h = self.current?;
        if self.remaining == 0 {
            self.current = None;
            return None;
        }
        self.remaining -= 1;
        let next = self.half_edges.get(h)?.next;
        self.current = (next != self.start).then_some(next);
        Some(h)
    }
}
