//! Closure checks and topology analysis.
//!
//! A closed, consistently oriented surface uses every edge exactly twice,
//! once in each direction. [`IndexedMesh::check_closure`] is the cheap test
//! run after an operation; [`analyze_faces`] computes the full report for any
//! indexed face list.

use super::{EdgeId, IndexedMesh, VertexId};
use crate::errors::{BooleanOpError, BooleanResult};
use hashbrown::HashMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifoldAnalysis {
    /// No boundary or non-manifold edges, no isolated vertices, consistent winding
    pub is_manifold: bool,
    /// Edges used by a single face
    pub boundary_edges: usize,
    /// Edges used by more than two faces
    pub non_manifold_edges: usize,
    pub isolated_vertices: usize,
    /// Edge-connected groups of faces
    pub connected_components: usize,
    /// Every two-face edge is walked once in each direction
    pub consistent_orientation: bool,
    /// V - E + F
    pub euler_characteristic: i64,
}

impl ManifoldAnalysis {
    /// Closed and manifold: no boundary, every edge shared by exactly two faces.
    pub fn is_closed(&self) -> bool {
        self.is_manifold && self.boundary_edges == 0
    }
}

impl IndexedMesh {
    /// Edges bordered by an odd number of live faces.
    pub fn open_edges(&self) -> Vec<EdgeId> {
        self.edges()
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.faces().len() % 2 == 1)
            .map(|(e, _)| e)
            .collect()
    }

    /// Fails on the first edge bordered by an odd number of live faces.
    pub fn check_closure(&self) -> BooleanResult<()> {
        let open = self.open_edges();
        let Some(&edge) = open.first() else {
            return Ok(());
        };
        let e = self.edge(edge);
        warn!(open = open.len(), edge, "result is not closed");
        Err(BooleanOpError::TopologyInconsistency {
            edge,
            vertices: e.vertices(),
            faces: e.faces().len(),
        })
    }

    /// Topology report over the live faces.
    pub fn analyze_manifold(&self) -> ManifoldAnalysis {
        let faces: Vec<&[VertexId]> = self
            .live_faces()
            .map(|f| self.face(f).indices())
            .collect();
        let used = self
            .vertices()
            .iter()
            .filter(|v| !v.is_broken())
            .count();
        analyze_faces(used, faces)
    }
}

/// Analyzes a face list over vertices `0..num_vertices`.
pub fn analyze_faces<'a>(num_vertices: usize, faces: impl IntoIterator<Item = &'a [usize]>) -> ManifoldAnalysis {
    let faces: Vec<&[usize]> = faces.into_iter().collect();

    // Canonical edge -> (face, walked low-to-high)
    let mut edge_faces: HashMap<(usize, usize), Vec<(usize, bool)>> = HashMap::new();
    let mut vertex_used = vec![false; num_vertices];
    for (f, indices) in faces.iter().enumerate() {
        let n = indices.len();
        for i in 0..n {
            let (a, b) = (indices[i], indices[(i + 1) % n]);
            if let Some(used) = vertex_used.get_mut(a) {
                *used = true;
            }
            let key = (a.min(b), a.max(b));
            edge_faces.entry(key).or_default().push((f, a < b));
        }
    }

    let mut boundary_edges = 0;
    let mut non_manifold_edges = 0;
    let mut consistent_orientation = true;
    for uses in edge_faces.values() {
        match uses.as_slice() {
            [_] => boundary_edges += 1,
            [(_, forward1), (_, forward2)] => {
                if forward1 == forward2 {
                    consistent_orientation = false;
                }
            },
            _ => non_manifold_edges += 1,
        }
    }

    let isolated_vertices = vertex_used.iter().filter(|&&used| !used).count();
    let connected_components = count_components(faces.len(), &edge_faces);
    let euler_characteristic = num_vertices as i64 - edge_faces.len() as i64 + faces.len() as i64;

    ManifoldAnalysis {
        is_manifold: non_manifold_edges == 0 && isolated_vertices == 0 && consistent_orientation,
        boundary_edges,
        non_manifold_edges,
        isolated_vertices,
        connected_components,
        consistent_orientation,
        euler_characteristic,
    }
}

fn count_components(num_faces: usize, edge_faces: &HashMap<(usize, usize), Vec<(usize, bool)>>) -> usize {
    let mut parent: Vec<usize> = (0..num_faces).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for uses in edge_faces.values() {
        for pair in uses.windows(2) {
            let (a, b) = (find(&mut parent, pair[0].0), find(&mut parent, pair[1].0));
            if a != b {
                parent[a] = b;
            }
        }
    }
    (0..num_faces).filter(|&f| find(&mut parent, f) == f).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid::{Operand, Solid};
    use crate::tag::FaceTag;
    use nalgebra::Point3;

    fn tetrahedron_faces() -> Vec<[usize; 3]> {
        vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]]
    }

    #[test]
    fn tetrahedron_is_closed_sphere() {
        let faces = tetrahedron_faces();
        let analysis = analyze_faces(4, faces.iter().map(|f| &f[..]));
        assert!(analysis.is_closed());
        assert_eq!(analysis.euler_characteristic, 2);
        assert_eq!(analysis.connected_components, 1);
    }

    #[test]
    fn flipped_face_breaks_orientation() {
        let mut faces = tetrahedron_faces();
        faces[0].reverse();
        let analysis = analyze_faces(4, faces.iter().map(|f| &f[..]));
        assert!(!analysis.consistent_orientation);
        assert!(!analysis.is_manifold);
    }

    #[test]
    fn missing_face_leaves_boundary() {
        let faces = tetrahedron_faces();
        let analysis = analyze_faces(5, faces[1..].iter().map(|f| &f[..]));
        assert_eq!(analysis.boundary_edges, 3);
        assert_eq!(analysis.isolated_vertices, 1);
        assert!(!analysis.is_closed());
    }

    #[test]
    fn closure_check_on_imported_cube() {
        let cube = Solid::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(Operand::A, cube.faces, cube.vertices).unwrap();
        assert!(mesh.check_closure().is_ok());
        assert!(mesh.analyze_manifold().is_closed());

        mesh.set_face_tag(0, FaceTag::Broken);
        assert_eq!(mesh.open_edges().len(), 3);
        assert!(matches!(
            mesh.check_closure(),
            Err(BooleanOpError::TopologyInconsistency { faces: 1, .. })
        ));
    }
}
