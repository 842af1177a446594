use tracing::debug;

use crate::arrangement::{Arrangement, FaceId};
use crate::error::Result;

/// Disjoint partition of the classifiable bounded faces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceClassification {
    /// Faces with a doorstep on their outer boundary or on a hole.
    pub floors: Vec<FaceId>,
    /// Hole-free faces without a doorstep.
    pub fillers: Vec<FaceId>,
}

/// Splits the bounded faces of an arrangement into floors and fillers.
///
/// A face without a doorstep that has holes belongs to neither set.
#[derive(Debug, Default)]
pub struct ClassifyFaces;

impl ClassifyFaces {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the classification.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::FacesOutdated` if faces were not rebuilt after
    /// the last mutation.
    pub fn execute(&self, arrangement: &Arrangement) -> Result<FaceClassification> {
        let mut result = FaceClassification::default();
        let mut excluded = 0;
        for face_id in arrangement.bounded_faces()? {
            let face = arrangement.face(face_id)?;
            let has_doorstep = face
                .cycles()
                .any(|start| arrangement.ccb(start).any(|h| arrangement.is_doorstep(h)));
            if has_doorstep {
                result.floors.push(face_id);
            } else if face.holes.is_empty() {
                result.fillers.push(face_id);
            } else {
                excluded += 1;
            }
        }
        debug!(
            floors = result.floors.len(),
            fillers = result.fillers.len(),
            excluded,
            "classified faces"
        );
        Ok(result)
    }
}
