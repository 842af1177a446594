//! Mutation of the subdivision: segment insertion, edge splitting and
//! edge removal.

use std::collections::HashSet;

use tracing::trace;

use super::{Arrangement, HalfEdgeData, HalfEdgeId, VertexData, VertexId};
use crate::error::{GeometryError, Result, TopologyError};
use crate::math::exact::{compare_direction, intersect_segments, sort_along, SegmentIntersection};
use crate::math::ExactPoint;

impl Arrangement {
    /// Inserts the segment `a -> b`.
    ///
    /// Existing edges crossed or touched in their interior are split, and
    /// parts of the segment that coincide with existing edges reuse them.
    /// Returns the half-edges covering the segment, ordered from `a` to `b`
    /// and each oriented in that direction.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Degenerate` if `a == b`.
    pub fn insert_segment(&mut self, a: &ExactPoint, b: &ExactPoint) -> Result<Vec<HalfEdgeId>> {
        if a == b {
            return Err(GeometryError::Degenerate("zero-length segment".into()).into());
        }

        let mut points = vec![a.clone(), b.clone()];
        let mut splits: Vec<(HalfEdgeId, ExactPoint)> = Vec::new();
        let edges: Vec<HalfEdgeId> = self.edges().collect();
        for h in edges {
            let p = self.source_point(h)?.clone();
            let q = self.target_point(h)?.clone();
            let hits = match intersect_segments(a, b, &p, &q) {
                SegmentIntersection::Disjoint => continue,
                SegmentIntersection::Point(x) => vec![x],
                SegmentIntersection::Overlap(x, y) => vec![x, y],
            };
            for x in hits {
                if x != p && x != q {
                    splits.push((h, x.clone()));
                }
                points.push(x);
            }
        }

        // Split every crossed edge at all of its hit points, walking from its
        // source so that each following point lies on the new tail piece.
        let mut split_edges: Vec<HalfEdgeId> = splits.iter().map(|(h, _)| *h).collect();
        split_edges.sort_unstable();
        split_edges.dedup();
        for h in split_edges {
            let p = self.source_point(h)?.clone();
            let q = self.target_point(h)?.clone();
            let on_edge = splits
                .iter()
                .filter(|(e, _)| *e == h)
                .map(|(_, x)| x.clone())
                .collect();
            let mut piece = h;
            for x in sort_along(&p, &q, on_edge) {
                let (_, tail) = self.split_edge(piece, &x)?;
                piece = tail;
            }
        }

        let ordered = sort_along(a, b, points);
        let vertices: Vec<VertexId> = ordered.into_iter().map(|p| self.vertex_or_insert(p)).collect();

        let mut induced = Vec::with_capacity(vertices.len().saturating_sub(1));
        let mut touched = Vec::new();
        for pair in vertices.windows(2) {
            let (u, w) = (pair[0], pair[1]);
            if let Some(h) = self.find_half_edge(u, w) {
                induced.push(h);
            } else {
                induced.push(self.create_edge(u, w)?);
                touched.push(u);
                touched.push(w);
            }
        }
        self.relink_all(touched)?;
        self.faces_valid = false;

        trace!(pieces = induced.len(), "inserted segment");
        Ok(induced)
    }

    /// Splits the edge of `h` at `x`, which must lie strictly inside it.
    ///
    /// `h` keeps its origin and now ends at the new vertex; the returned
    /// half-edge continues from the new vertex to the old target in the
    /// same direction. Doorstep tags are copied to the new pieces.
    ///
    /// # Errors
    ///
    /// Returns an error if `h` does not exist or `x` is already a vertex.
    pub fn split_edge(
        &mut self,
        h: HalfEdgeId,
        x: &ExactPoint,
    ) -> std::result::Result<(VertexId, HalfEdgeId), TopologyError> {
        if self.point_index.contains_key(x) {
            return Err(TopologyError::InvalidTopology(
                "split point is already a vertex".into(),
            ));
        }
        let t = self.twin(h)?;
        let u = self.origin(h)?;
        let w = self.origin(t)?;
        let primary = self.half_edge(h)?.primary;

        let m = self.vertex_or_insert(x.clone());
        let (h2, t2) = self.create_pair(m, w, primary);

        // t now runs m -> u.
        self.half_edge_mut(t)?.origin = m;
        let w_data = self.vertex_mut(w)?;
        for out in &mut w_data.outgoing {
            if *out == t {
                *out = t2;
            }
        }
        let m_data = self.vertex_mut(m)?;
        m_data.outgoing.push(t);
        m_data.outgoing.push(h2);

        if let Some(tag) = self.doorsteps.get(h).copied() {
            self.doorsteps.insert(h2, tag);
        }
        if let Some(tag) = self.doorsteps.get(t).copied() {
            self.doorsteps.insert(t2, tag);
        }

        self.relink_all(vec![u, m, w])?;
        self.faces_valid = false;
        Ok((m, h2))
    }

    /// Removes the edge of `h` (both half-edges and their tags). Vertices
    /// left without edges are removed too.
    ///
    /// # Errors
    ///
    /// Returns an error if `h` does not exist.
    pub fn remove_edge(&mut self, h: HalfEdgeId) -> std::result::Result<(), TopologyError> {
        let t = self.twin(h)?;
        let u = self.origin(h)?;
        let w = self.origin(t)?;

        self.vertex_mut(u)?.outgoing.retain(|&e| e != h);
        self.vertex_mut(w)?.outgoing.retain(|&e| e != t);
        self.half_edges.remove(h);
        self.half_edges.remove(t);
        self.doorsteps.remove(h);
        self.doorsteps.remove(t);

        let mut touched = Vec::new();
        for v in [u, w] {
            if self.vertex(v)?.outgoing.is_empty() {
                if let Some(data) = self.vertices.remove(v) {
                    self.point_index.remove(&data.point);
                }
            } else {
                touched.push(v);
            }
        }
        self.relink_all(touched)?;
        self.faces_valid = false;
        Ok(())
    }

    fn vertex_or_insert(&mut self, p: ExactPoint) -> VertexId {
        if let Some(&v) = self.point_index.get(&p) {
            return v;
        }
        let v = self.vertices.insert(VertexData::new(p.clone()));
        self.point_index.insert(p, v);
        v
    }

    /// Allocates a twin pair `u -> w` / `w -> u` without linking it into
    /// the vertex rotations.
    fn create_pair(&mut self, u: VertexId, w: VertexId, primary: bool) -> (HalfEdgeId, HalfEdgeId) {
        let h = self.half_edges.insert_with_key(|h| HalfEdgeData {
            origin: u,
            twin: h,
            next: h,
            prev: h,
            face: None,
            primary,
        });
        let t = self.half_edges.insert(HalfEdgeData {
            origin: w,
            twin: h,
            next: h,
            prev: h,
            face: None,
            primary: !primary,
        });
        if let Some(data) = self.half_edges.get_mut(h) {
            data.twin = t;
            data.next = t;
            data.prev = t;
        }
        (h, t)
    }

    /// Creates a new edge `u -> w` and registers it at both vertices. The
    /// caller relinks the vertices.
    fn create_edge(&mut self, u: VertexId, w: VertexId) -> std::result::Result<HalfEdgeId, TopologyError> {
        let (h, t) = self.create_pair(u, w, true);
        self.vertex_mut(u)?.outgoing.push(h);
        self.vertex_mut(w)?.outgoing.push(t);
        Ok(h)
    }

    fn relink_all(&mut self, mut vertices: Vec<VertexId>) -> std::result::Result<(), TopologyError> {
        let mut seen = HashSet::new();
        vertices.retain(|v| seen.insert(*v));
        for v in vertices {
            self.relink_vertex(v)?;
        }
        Ok(())
    }

    /// Sorts the outgoing half-edges of `v` counter-clockwise and rewires
    /// `next`/`prev` around it: the successor of an incoming half-edge is
    /// the outgoing half-edge clockwise from its twin.
    fn relink_vertex(&mut self, v: VertexId) -> std::result::Result<(), TopologyError> {
        let origin = self.point(v)?.clone();
        let outgoing = self.vertex(v)?.outgoing.clone();

        let mut keyed = Vec::with_capacity(outgoing.len());
        for h in outgoing {
            keyed.push((h, self.target_point(h)?.clone()));
        }
        keyed.sort_by(|a, b| compare_direction(&origin, &a.1, &b.1));
        let sorted: Vec<HalfEdgeId> = keyed.into_iter().map(|(h, _)| h).collect();

        let n = sorted.len();
        for i in 0..n {
            let h = sorted[i];
            let clockwise = sorted[(i + n - 1) % n];
            let incoming = self.twin(h)?;
            self.half_edge_mut(incoming)?.next = clockwise;
            self.half_edge_mut(clockwise)?.prev = incoming;
        }
        self.vertex_mut(v)?.outgoing = sorted;
        Ok(())
    }
}
