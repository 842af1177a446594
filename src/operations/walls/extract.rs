use tracing::debug;

use super::WallSection;
use crate::arrangement::{Arrangement, FaceId, HalfEdgeId};
use crate::error::{CompileError, Result};
use crate::math::polygon_2d::Orientation;

/// Extracts wall sections from the boundaries of a set of faces.
///
/// Each boundary cycle is cut at its doorstep-tagged half-edges. The points
/// of an open section are the vertices strictly between one doorstep's
/// target and the next doorstep's source, in `next` order. Holes are walked
/// along `next` too, which already follows their clockwise winding. A
/// doorstep split by a later insertion shows up as consecutive tagged
/// half-edges, which leave an empty span between them.
#[derive(Debug)]
pub struct ExtractWalls<'a> {
    faces: &'a [FaceId],
}

impl<'a> ExtractWalls<'a> {
    #[must_use]
    pub fn new(faces: &'a [FaceId]) -> Self {
        Self { faces }
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::DoorStep` if a doorstep half-edge has an
    /// untagged twin, or a topology error if faces are outdated.
    pub fn execute(&self, arrangement: &Arrangement) -> Result<Vec<WallSection>> {
        let mut sections = Vec::new();
        for &face_id in self.faces {
            let face = arrangement.face(face_id)?;
            if let Some(outer) = face.outer {
                Self::extract_cycle(arrangement, outer, Orientation::CounterClockwise, &mut sections)?;
            }
            for &hole in &face.holes {
                Self::extract_cycle(arrangement, hole, Orientation::Clockwise, &mut sections)?;
            }
        }
        debug!(
            faces = self.faces.len(),
            sections = sections.len(),
            "extracted wall sections"
        );
        Ok(sections)
    }

    fn extract_cycle(
        arrangement: &Arrangement,
        start: HalfEdgeId,
        orientation: Orientation,
        out: &mut Vec<WallSection>,
    ) -> Result<()> {
        let members: Vec<HalfEdgeId> = arrangement.ccb(start).collect();
        let mut marks = Vec::new();
        for (i, &h) in members.iter().enumerate() {
            if arrangement.is_doorstep(h) {
                if !arrangement.is_doorstep(arrangement.twin(h)?) {
                    return Err(door_step("doorstep half-edge with an untagged twin"));
                }
                marks.push(i);
            }
        }

        if marks.is_empty() {
            let points = members
                .iter()
                .map(|&h| Ok(arrangement.source_point(h)?.to_point()))
                .collect::<Result<Vec<_>>>()?;
            out.push(WallSection::closed(points, orientation));
            return Ok(());
        }

        let n = members.len();
        for (k, &d) in marks.iter().enumerate() {
            let next = marks[(k + 1) % marks.len()];
            let span = (next + n - d - 1) % n;
            let mut points = Vec::with_capacity(span.saturating_sub(1));
            for step in 2..=span {
                points.push(arrangement.source_point(members[(d + step) % n])?.to_point());
            }
            if !points.is_empty() {
                out.push(WallSection::open(points, orientation, k));
            }
        }
        Ok(())
    }
}

fn door_step(message: &str) -> crate::error::FloorplanError {
    CompileError::DoorStep(message.to_owned()).into()
}
