use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::debug;

use super::FloorMesh;
use crate::error::{Result, TessellationError};
use crate::math::Point2;
use crate::output::PolygonWithHoles;

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Triangulates a floor polygon, holes excluded, with a constrained
/// Delaunay triangulation.
#[derive(Debug)]
pub struct TessellateFloor<'a> {
    floor: &'a PolygonWithHoles,
}

impl<'a> TessellateFloor<'a> {
    #[must_use]
    pub fn new(floor: &'a PolygonWithHoles) -> Self {
        Self { floor }
    }

    /// Executes the triangulation.
    ///
    /// # Errors
    ///
    /// Returns `TessellationError::InvalidInput` for rings with fewer than
    /// three points or non-finite coordinates, and
    /// `TessellationError::Failed` if the triangulation rejects a vertex.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> Result<FloorMesh> {
        let mut cdt = Cdt::new();
        insert_constraint_loop(&mut cdt, &self.floor.outer)?;
        for hole in &self.floor.holes {
            insert_constraint_loop(&mut cdt, hole)?;
        }

        let interior = classify_interior_faces(&cdt);
        let mut mesh = FloorMesh::default();
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();
        for face in cdt.inner_faces() {
            if !interior.contains(&face.fix().index()) {
                continue;
            }
            let mut triangle = [0u32; 3];
            for (slot, vertex) in triangle.iter_mut().zip(face.vertices()) {
                let key = vertex.fix().index();
                *slot = *vertex_map.entry(key).or_insert_with(|| {
                    let pos = vertex.position();
                    mesh.vertices.push(Point2::new(pos.x, pos.y));
                    (mesh.vertices.len() - 1) as u32
                });
            }
            mesh.indices.push(triangle);
        }

        debug!(
            holes = self.floor.holes.len(),
            triangles = mesh.indices.len(),
            "tessellated floor"
        );
        Ok(mesh)
    }
}

fn insert_constraint_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<()> {
    if points.len() < 3 {
        return Err(TessellationError::InvalidInput("ring needs at least 3 points".into()).into());
    }
    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(TessellationError::InvalidInput(format!("non-finite point ({}, {})", p.x, p.y)).into());
        }
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }
    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to {
            cdt.add_constraint(from, to);
        }
    }
    Ok(())
}

/// Flood-fills the inner faces from the hull; crossing a constraint
/// flips between outside and inside. Odd depth means interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer = cdt.outer_face().fix();
    for edge in cdt.directed_edges().filter(|e| e.face().fix() == outer) {
        let Some(inner) = edge.rev().face().as_inner() else {
            continue;
        };
        let index = inner.fix().index();
        if depth.contains_key(&index) {
            continue;
        }
        let d = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
        depth.insert(index, d);
        queue.push_back((inner.fix(), d));
    }

    while let Some((face, d)) = queue.pop_front() {
        if d % 2 == 1 {
            interior.insert(face.index());
        }
        for edge in cdt.face(face).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let index = neighbor.fix().index();
            if depth.contains_key(&index) {
                continue;
            }
            let next = d + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth.insert(index, next);
            queue.push_back((neighbor.fix(), next));
        }
    }
    interior
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::FloorplanError;

    fn square(x: f64, y: f64, size: f64) -> Vec<Point2> {
        vec![
            Point2::new(x, y),
            Point2::new(x + size, y),
            Point2::new(x + size, y + size),
            Point2::new(x, y + size),
        ]
    }

    #[test]
    fn square_makes_two_triangles() {
        let floor = PolygonWithHoles::new(square(0.0, 0.0, 2.0), Vec::new());
        let mesh = TessellateFloor::new(&floor).execute().unwrap();
        assert_eq!(mesh.indices.len(), 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert_relative_eq!(mesh.area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn l_shape_is_concave() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let mesh = TessellateFloor::new(&PolygonWithHoles::new(outer, Vec::new()))
            .execute()
            .unwrap();
        assert_eq!(mesh.indices.len(), 4);
        assert_relative_eq!(mesh.area(), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn holes_are_excluded() {
        let floor = PolygonWithHoles::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)]);
        let mesh = TessellateFloor::new(&floor).execute().unwrap();
        assert_relative_eq!(mesh.area(), 96.0, epsilon = 1e-9);
        assert_eq!(mesh.vertices.len(), 8);
    }

    #[test]
    fn short_ring_is_rejected() {
        let floor = PolygonWithHoles::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)], Vec::new());
        assert!(matches!(
            TessellateFloor::new(&floor).execute(),
            Err(FloorplanError::Tessellation(TessellationError::InvalidInput(_)))
        ));
    }
}
