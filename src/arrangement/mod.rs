//! Exact planar subdivision (doubly connected edge list).
//!
//! Vertices, half-edges and faces live in slotmap arenas and reference each
//! other through generation-checked keys, so a stale id fails with
//! `TopologyError::EntityNotFound` instead of dangling. Doorstep tags are kept
//! in a side-table keyed by half-edge id.

pub mod face;
pub mod half_edge;
pub mod insert;
pub mod rebuild;
pub mod vertex;

pub use face::{Ccb, FaceData, FaceId};
pub use half_edge::{Doorstep, HalfEdgeData, HalfEdgeId};
pub use vertex::{VertexData, VertexId};

use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};

use crate::error::TopologyError;
use crate::math::{ExactPoint, Point2};

/// Central arena owning the planar subdivision.
///
/// Faces are derived data: any mutation marks them outdated, and face
/// queries fail with `TopologyError::FacesOutdated` until
/// [`Arrangement::rebuild_faces`] runs again.
#[derive(Debug)]
pub struct Arrangement {
    vertices: SlotMap<VertexId, VertexData>,
    half_edges: SlotMap<HalfEdgeId, HalfEdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    unbounded: FaceId,
    doorsteps: SecondaryMap<HalfEdgeId, Doorstep>,
    point_index: HashMap<ExactPoint, VertexId>,
    faces_valid: bool,
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new()
    }
}

impl Arrangement {
    /// Creates an empty arrangement consisting of the unbounded face only.
    #[must_use]
    pub fn new() -> Self {
        let mut faces = SlotMap::with_key();
        let unbounded = faces.insert(FaceData::default());
        Self {
            vertices: SlotMap::with_key(),
            half_edges: SlotMap::with_key(),
            faces,
            unbounded,
            doorsteps: SecondaryMap::new(),
            point_index: HashMap::new(),
            faces_valid: true,
        }
    }

    // --- Vertex access ---

    /// Returns the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex does not exist.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    pub(crate) fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns the exact position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex does not exist.
    pub fn point(&self, id: VertexId) -> Result<&ExactPoint, TopologyError> {
        Ok(&self.vertex(id)?.point)
    }

    /// Returns the vertex located exactly at `p`, if any.
    #[must_use]
    pub fn vertex_at(&self, p: &ExactPoint) -> Option<VertexId> {
        self.point_index.get(p).copied()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    // --- Half-edge access ---

    /// Returns the half-edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn half_edge(&self, id: HalfEdgeId) -> Result<&HalfEdgeData, TopologyError> {
        self.half_edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("half-edge".into()))
    }

    pub(crate) fn half_edge_mut(
        &mut self,
        id: HalfEdgeId,
    ) -> Result<&mut HalfEdgeData, TopologyError> {
        self.half_edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("half-edge".into()))
    }

    /// Returns `true` if the half-edge still exists.
    #[must_use]
    pub fn contains_half_edge(&self, id: HalfEdgeId) -> bool {
        self.half_edges.contains_key(id)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn twin(&self, id: HalfEdgeId) -> Result<HalfEdgeId, TopologyError> {
        Ok(self.half_edge(id)?.twin)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn next(&self, id: HalfEdgeId) -> Result<HalfEdgeId, TopologyError> {
        Ok(self.half_edge(id)?.next)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn prev(&self, id: HalfEdgeId) -> Result<HalfEdgeId, TopologyError> {
        Ok(self.half_edge(id)?.prev)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn origin(&self, id: HalfEdgeId) -> Result<VertexId, TopologyError> {
        Ok(self.half_edge(id)?.origin)
    }

    /// Vertex the half-edge points to (the origin of its twin).
    ///
    /// # Errors
    ///
    /// Returns an error if the half-edge or its twin does not exist.
    pub fn target(&self, id: HalfEdgeId) -> Result<VertexId, TopologyError> {
        self.origin(self.twin(id)?)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge or its origin does not exist.
    pub fn source_point(&self, id: HalfEdgeId) -> Result<&ExactPoint, TopologyError> {
        self.point(self.origin(id)?)
    }

    /// # Errors
    ///
    /// Returns an error if the half-edge, its twin or its target does not
    /// exist.
    pub fn target_point(&self, id: HalfEdgeId) -> Result<&ExactPoint, TopologyError> {
        self.point(self.target(id)?)
    }

    /// Finds the half-edge running from `u` to `w`.
    #[must_use]
    pub fn find_half_edge(&self, u: VertexId, w: VertexId) -> Option<HalfEdgeId> {
        let data = self.vertices.get(u)?;
        data.outgoing
            .iter()
            .copied()
            .find(|&h| self.target(h).is_ok_and(|t| t == w))
    }

    /// One half-edge per edge.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.half_edges
            .iter()
            .filter(|(_, data)| data.primary)
            .map(|(id, _)| id)
    }

    /// Iterates the `next` cycle starting at `start`.
    #[must_use]
    pub fn ccb(&self, start: HalfEdgeId) -> Ccb<'_> {
        Ccb::new(&self.half_edges, start)
    }

    /// Origins of the half-edges of the `next` cycle starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if a half-edge of the cycle references a missing
    /// vertex.
    pub fn cycle_points(&self, start: HalfEdgeId) -> Result<Vec<ExactPoint>, TopologyError> {
        self.ccb(start)
            .map(|h| self.source_point(h).cloned())
            .collect()
    }

    // --- Face access ---

    fn check_faces(&self) -> Result<(), TopologyError> {
        if self.faces_valid {
            Ok(())
        } else {
            Err(TopologyError::FacesOutdated)
        }
    }

    /// Returns `true` if faces reflect the current edges.
    #[must_use]
    pub fn faces_valid(&self) -> bool {
        self.faces_valid
    }

    #[must_use]
    pub fn unbounded_face(&self) -> FaceId {
        self.unbounded
    }

    /// Returns the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `FacesOutdated` if the arrangement changed since the last
    /// rebuild, or an error if the face does not exist.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.check_faces()?;
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// All bounded faces.
    ///
    /// # Errors
    ///
    /// Returns `FacesOutdated` if the arrangement changed since the last
    /// rebuild.
    pub fn bounded_faces(&self) -> Result<Vec<FaceId>, TopologyError> {
        self.check_faces()?;
        Ok(self
            .faces
            .keys()
            .filter(|&f| f != self.unbounded)
            .collect())
    }

    /// Face on the left of a half-edge.
    ///
    /// # Errors
    ///
    /// Returns `FacesOutdated` if the arrangement changed since the last
    /// rebuild, or an error if the half-edge does not exist.
    pub fn incident_face(&self, id: HalfEdgeId) -> Result<FaceId, TopologyError> {
        self.check_faces()?;
        self.half_edge(id)?
            .face
            .ok_or_else(|| TopologyError::InvalidTopology("half-edge without face".into()))
    }

    // --- Doorstep tags ---

    #[must_use]
    pub fn doorstep(&self, id: HalfEdgeId) -> Option<Doorstep> {
        self.doorsteps.get(id).copied()
    }

    #[must_use]
    pub fn is_doorstep(&self, id: HalfEdgeId) -> bool {
        self.doorsteps.contains_key(id)
    }

    /// Tags a half-edge as a doorstep.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-edge does not exist.
    pub fn set_doorstep(&mut self, id: HalfEdgeId, tag: Doorstep) -> Result<(), TopologyError> {
        if !self.half_edges.contains_key(id) {
            return Err(TopologyError::EntityNotFound("half-edge".into()));
        }
        self.doorsteps.insert(id, tag);
        Ok(())
    }

    /// Number of tagged half-edges.
    #[must_use]
    pub fn doorstep_count(&self) -> usize {
        self.doorsteps.len()
    }

    // --- Statistics ---

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.half_edges.len() / 2
    }

    /// Number of bounded faces.
    ///
    /// # Errors
    ///
    /// Returns `FacesOutdated` if the arrangement changed since the last
    /// rebuild.
    pub fn face_count(&self) -> Result<usize, TopologyError> {
        self.check_faces()?;
        Ok(self.faces.len() - 1)
    }

    /// Sum of all edge lengths.
    #[must_use]
    pub fn total_edge_length(&self) -> f64 {
        self.segments()
            .iter()
            .map(|(a, b, _)| (b - a).norm())
            .sum()
    }

    /// Every edge as a floating-point segment, with its doorstep flag.
    #[must_use]
    pub fn segments(&self) -> Vec<(Point2, Point2, bool)> {
        self.edges()
            .filter_map(|h| {
                let a = self.source_point(h).ok()?.to_point();
                let b = self.target_point(h).ok()?.to_point();
                let tagged = self.is_doorstep(h) || self.twin(h).is_ok_and(|t| self.is_doorstep(t));
                Some((a, b, tagged))
            })
            .collect()
    }
}
