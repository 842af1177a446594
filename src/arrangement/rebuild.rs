//! Face reconstruction from the half-edge cycles.

use std::collections::{HashSet, VecDeque};

use slotmap::SecondaryMap;
use tracing::debug;

use super::{Arrangement, FaceData, FaceId, HalfEdgeId, VertexId};
use crate::error::TopologyError;
use crate::math::exact::{point_in_ring, signed_area_twice};
use crate::math::{ExactPoint, Scalar};

struct Cycle {
    start: HalfEdgeId,
    members: Vec<HalfEdgeId>,
    ring: Vec<ExactPoint>,
    area: Scalar,
    component: usize,
}

impl Arrangement {
    /// Recomputes every face from the current `next` cycles.
    ///
    /// Cycles with positive area bound a face. Every connected component
    /// has exactly one other cycle, its outer boundary, which becomes a
    /// hole of the smallest face of another component that contains it,
    /// or of the unbounded face.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::InvalidTopology` if a `next` chain does not
    /// close.
    pub fn rebuild_faces(&mut self) -> Result<(), TopologyError> {
        let unbounded = self.unbounded;
        self.faces.retain(|id, _| id == unbounded);
        if let Some(face) = self.faces.get_mut(unbounded) {
            face.holes.clear();
        }
        for (_, data) in &mut self.half_edges {
            data.face = None;
        }

        let component = self.label_components()?;
        let cycles = self.trace_cycles(&component)?;

        let zero = Scalar::from_integer(0.into());
        let mut bounded: Vec<(FaceId, &Cycle)> = Vec::new();
        for cycle in cycles.iter().filter(|c| c.area > zero) {
            let face = self.faces.insert(FaceData {
                outer: Some(cycle.start),
                holes: Vec::new(),
            });
            bounded.push((face, cycle));
        }

        let mut assignments: Vec<(FaceId, &Cycle)> = bounded.clone();
        for cycle in cycles.iter().filter(|c| c.area <= zero) {
            let sample = &cycle.ring[0];
            let host = bounded
                .iter()
                .filter(|(_, c)| c.component != cycle.component && point_in_ring(sample, &c.ring))
                .min_by(|a, b| a.1.area.cmp(&b.1.area))
                .map_or(unbounded, |(f, _)| *f);
            if let Some(face) = self.faces.get_mut(host) {
                face.holes.push(cycle.start);
            }
            assignments.push((host, cycle));
        }

        for (face, cycle) in assignments {
            for &h in &cycle.members {
                if let Some(data) = self.half_edges.get_mut(h) {
                    data.face = Some(face);
                }
            }
        }

        self.faces_valid = true;
        debug!(
            faces = self.faces.len() - 1,
            components = cycles.iter().filter(|c| c.area <= zero).count(),
            "rebuilt faces"
        );
        Ok(())
    }

    fn label_components(&self) -> Result<SecondaryMap<VertexId, usize>, TopologyError> {
        let mut label = SecondaryMap::new();
        let mut next_label = 0;
        for seed in self.vertices.keys() {
            if label.contains_key(seed) {
                continue;
            }
            let mut queue = VecDeque::from([seed]);
            label.insert(seed, next_label);
            while let Some(v) = queue.pop_front() {
                for &h in &self.vertex(v)?.outgoing {
                    let w = self.target(h)?;
                    if !label.contains_key(w) {
                        label.insert(w, next_label);
                        queue.push_back(w);
                    }
                }
            }
            next_label += 1;
        }
        Ok(label)
    }

    fn trace_cycles(
        &self,
        component: &SecondaryMap<VertexId, usize>,
    ) -> Result<Vec<Cycle>, TopologyError> {
        let mut visited = HashSet::new();
        let mut cycles = Vec::new();
        for start in self.half_edges.keys() {
            if visited.contains(&start) {
                continue;
            }
            let members: Vec<HalfEdgeId> = self.ccb(start).collect();
            let closes = match members.last() {
                Some(&last) => self.next(last)? == start,
                None => false,
            };
            if !closes {
                return Err(TopologyError::InvalidTopology(
                    "boundary cycle does not close".into(),
                ));
            }
            let mut ring = Vec::with_capacity(members.len());
            for &h in &members {
                visited.insert(h);
                ring.push(self.source_point(h)?.clone());
            }
            let origin = self.origin(start)?;
            let label = component
                .get(origin)
                .copied()
                .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
            cycles.push(Cycle {
                start,
                area: signed_area_twice(&ring),
                members,
                ring,
                component: label,
            });
        }
        Ok(cycles)
    }
}
