//! Result of a boolean operation.
//!
//! [`BooleanMesh`] is a compact, self-contained copy of the live part of the
//! working mesh: vertices renumbered densely, faces as triangles or quads
//! with their plane and provenance, and the undirected edges between them.

use crate::aabb::Aabb;
use crate::errors::{BooleanOpError, BooleanResult};
use crate::float_types::Real;
use crate::math;
use crate::mesh::manifold::{ManifoldAnalysis, analyze_faces};
use crate::mesh::{FaceId, FaceVertices, IndexedMesh, VertexId};
use crate::plane::Plane;
use crate::solid::{FaceRecord, FaceSource, Operand, Solid};
use hashbrown::HashMap;
use nalgebra::Point3;

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFace {
    /// Indices into [`BooleanMesh::vertices`], counter-clockwise from outside
    pub vertices: FaceVertices,
    pub plane: Plane,
    /// Operand and input face this face was cut from
    pub source: FaceSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEdge {
    pub vertices: [usize; 2],
    /// Indices into [`BooleanMesh::faces`]
    pub faces: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanMesh {
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<OutputFace>,
    pub edges: Vec<OutputEdge>,
}

impl BooleanMesh {
    /// Copies the live faces of `mesh` and the vertices they use.
    pub fn from_indexed(mesh: &IndexedMesh) -> BooleanResult<Self> {
        let live: Vec<FaceId> = mesh.live_faces().collect();

        let mut faces = Vec::new();
        faces
            .try_reserve_exact(live.len())
            .map_err(|_| BooleanOpError::AllocationFailed { what: "result faces" })?;
        let mut vertices = Vec::new();
        let mut remap: Vec<Option<usize>> = Vec::new();
        remap
            .try_reserve_exact(mesh.num_vertices())
            .map_err(|_| BooleanOpError::AllocationFailed { what: "vertex map" })?;
        remap.resize(mesh.num_vertices(), None);

        let mut edge_index: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<OutputEdge> = Vec::new();

        for f in live {
            let face = mesh.face(f);
            let mut corners = [0; 4];
            let n = face.indices().len();
            for (slot, &v) in corners.iter_mut().zip(face.indices()) {
                *slot = match remap[v] {
                    Some(index) => index,
                    None => {
                        vertices
                            .try_reserve(1)
                            .map_err(|_| BooleanOpError::AllocationFailed { what: "result vertices" })?;
                        vertices.push(mesh.point(v));
                        remap[v] = Some(vertices.len() - 1);
                        vertices.len() - 1
                    },
                };
            }
            let Some(face_vertices) = FaceVertices::from_slice(&corners[..n]) else {
                continue;
            };

            let index = faces.len();
            for (a, b) in face_vertices.edges() {
                let key = (a.min(b), a.max(b));
                let e = *edge_index.entry(key).or_insert_with(|| {
                    edges.push(OutputEdge {
                        vertices: [key.0, key.1],
                        faces: Vec::new(),
                    });
                    edges.len() - 1
                });
                edges[e].faces.push(index);
            }
            faces.push(OutputFace {
                vertices: face_vertices,
                plane: *face.plane(),
                source: mesh.source(face.original_face()),
            });
        }

        Ok(BooleanMesh { vertices, faces, edges })
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles after fanning quads.
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.vertices.len() - 2).sum()
    }

    pub fn quad_count(&self) -> usize {
        self.faces.iter().filter(|f| f.vertices.len() == 4).count()
    }

    /// Faces cut from the given operand.
    pub fn faces_from(&self, operand: Operand) -> impl Iterator<Item = &OutputFace> + '_ {
        self.faces.iter().filter(move |f| f.source.operand == operand)
    }

    /// Corner positions of every triangle, quads fanned from their first corner.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<Real>; 3]> + '_ {
        self.faces.iter().flat_map(move |face| {
            let v = face.vertices.as_slice();
            (1..v.len() - 1).map(move |k| [self.vertices[v[0]], self.vertices[v[k]], self.vertices[v[k + 1]]])
        })
    }

    /// Enclosed volume; only meaningful for a closed result.
    pub fn volume(&self) -> Real {
        self.triangles()
            .map(|[a, b, c]| math::signed_volume6(&a, &b, &c))
            .sum::<Real>()
            / 6.0
    }

    pub fn surface_area(&self) -> Real {
        self.triangles()
            .map(|[a, b, c]| math::triangle_area(&a, &b, &c))
            .sum()
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Every edge is shared by an even number of faces.
    pub fn is_closed(&self) -> bool {
        self.edges.iter().all(|e| e.faces.len() % 2 == 0)
    }

    pub fn analyze(&self) -> ManifoldAnalysis {
        analyze_faces(self.vertices.len(), self.faces.iter().map(|f| f.vertices.as_slice()))
    }

    /// Converts back into an operand, numbering faces by output position so
    /// the result can feed another operation.
    pub fn to_solid(&self) -> Solid {
        let faces = self
            .faces
            .iter()
            .enumerate()
            .map(|(index, face)| FaceRecord {
                vertices: face.vertices,
                original_face: index,
            })
            .collect();
        Solid::new(self.vertices.clone(), faces)
    }

    /// Index of the vertex at `point`, if any lies within tolerance.
    pub fn find_vertex(&self, point: &Point3<Real>) -> Option<VertexId> {
        self.vertices.iter().position(|p| math::points_coincide(p, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::FaceTag;
    use approx::assert_relative_eq;

    fn cube_mesh() -> IndexedMesh {
        let cube = Solid::cuboid(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(Operand::A, cube.faces, cube.vertices).unwrap();
        mesh
    }

    #[test]
    fn export_keeps_live_faces_only() {
        let mut mesh = cube_mesh();
        let out = BooleanMesh::from_indexed(&mesh).unwrap();
        assert_eq!(out.face_count(), 12);
        assert_eq!(out.vertex_count(), 8);
        assert_eq!(out.edges.len(), 18);
        assert!(out.is_closed());
        assert_relative_eq!(out.volume(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(out.surface_area(), 22.0, epsilon = 1e-9);

        mesh.set_face_tag(0, FaceTag::Broken);
        mesh.set_face_tag(1, FaceTag::Broken);
        let out = BooleanMesh::from_indexed(&mesh).unwrap();
        assert_eq!(out.face_count(), 10);
        assert!(!out.is_closed());
        assert_eq!(out.analyze().boundary_edges, 4);
    }

    #[test]
    fn unused_vertices_are_dropped() {
        let mut mesh = cube_mesh();
        mesh.add_vertex(Point3::new(9.0, 9.0, 9.0));
        let out = BooleanMesh::from_indexed(&mesh).unwrap();
        assert_eq!(out.vertex_count(), 8);
        assert!(out.find_vertex(&Point3::new(9.0, 9.0, 9.0)).is_none());
        assert!(out.analyze().is_closed());
    }

    #[test]
    fn provenance_survives_export() {
        let out = BooleanMesh::from_indexed(&cube_mesh()).unwrap();
        let sources: Vec<_> = out.faces.iter().map(|f| f.source.original_face).collect();
        assert_eq!(sources, vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
        assert_eq!(out.faces_from(Operand::A).count(), 12);
        assert_eq!(out.faces_from(Operand::B).count(), 0);
    }

    #[test]
    fn round_trips_through_solid() {
        let out = BooleanMesh::from_indexed(&cube_mesh()).unwrap();
        let solid = out.to_solid();
        assert_eq!(solid.faces.len(), 12);
        assert_relative_eq!(solid.volume(), 6.0, epsilon = 1e-9);
    }
}
