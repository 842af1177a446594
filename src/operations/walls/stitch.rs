use std::collections::VecDeque;

use tracing::{debug, trace};

use super::WallSection;
use crate::error::{CompileError, Result};
use crate::math::polygon_2d::dedup_ring;
use crate::math::Point2;

/// Chains open wall sections into closed loops.
///
/// A list is complete once its tail lies within `tolerance` of its head.
/// Until then the closest remaining section whose front is near the tail
/// is appended, or whose back is near the head is prepended. Closed
/// sections form a loop on their own.
#[derive(Debug)]
pub struct StitchSections {
    sections: Vec<WallSection>,
    tolerance: f64,
}

#[derive(Debug, Clone, Copy)]
enum Joint {
    Append,
    Prepend,
}

impl StitchSections {
    #[must_use]
    pub fn new(sections: Vec<WallSection>, tolerance: f64) -> Self {
        Self {
            sections,
            tolerance,
        }
    }

    /// Executes the stitching.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::NoProgress` when an open list cannot be
    /// extended, which means a gap wider than the tolerance.
    pub fn execute(&self) -> Result<Vec<Vec<WallSection>>> {
        let mut remaining: VecDeque<WallSection> = self
            .sections
            .iter()
            .filter(|s| !s.points.is_empty())
            .cloned()
            .collect();
        let mut loops = Vec::new();

        while let Some(seed) = remaining.pop_front() {
            if seed.closed {
                loops.push(vec![seed]);
                continue;
            }
            let mut list = VecDeque::from([seed]);
            loop {
                let (head, tail) = match (
                    list.front().and_then(WallSection::front),
                    list.back().and_then(WallSection::back),
                ) {
                    (Some(h), Some(t)) => (*h, *t),
                    _ => break,
                };
                if (tail - head).norm() <= self.tolerance {
                    break;
                }
                let (index, joint) = self.closest_candidate(&remaining, &head, &tail).ok_or_else(|| {
                    CompileError::NoProgress(format!(
                        "no wall section continues the chain at ({:.3}, {:.3})",
                        tail.x, tail.y
                    ))
                })?;
                let Some(section) = remaining.remove(index) else {
                    break;
                };
                trace!(index = section.index, ?joint, "stitched wall section");
                match joint {
                    Joint::Append => list.push_back(section),
                    Joint::Prepend => list.push_front(section),
                }
            }
            loops.push(list.into());
        }

        debug!(
            sections = self.sections.len(),
            loops = loops.len(),
            "stitched wall sections"
        );
        Ok(loops)
    }

    fn closest_candidate(
        &self,
        remaining: &VecDeque<WallSection>,
        head: &Point2,
        tail: &Point2,
    ) -> Option<(usize, Joint)> {
        let mut best: Option<(f64, usize, Joint)> = None;
        for (i, section) in remaining.iter().enumerate() {
            if section.closed {
                continue;
            }
            let options = [
                (section.front().map(|p| (p - tail).norm()), Joint::Append),
                (section.back().map(|p| (p - head).norm()), Joint::Prepend),
            ];
            for (distance, joint) in options {
                let Some(d) = distance else { continue };
                if d <= self.tolerance && best.is_none_or(|(b, _, _)| d < b) {
                    best = Some((d, i, joint));
                }
            }
        }
        best.map(|(_, i, joint)| (i, joint))
    }
}

/// Concatenates the points of a stitched list into one ring, dropping
/// joints closer than `TOLERANCE`.
#[must_use]
pub fn flatten_loop(list: &[WallSection]) -> Vec<Point2> {
    let points: Vec<Point2> = list.iter().flat_map(|s| s.points.iter().copied()).collect();
    dedup_ring(&points)
}
