//! Indexed mesh shared by both operands of a boolean operation.
//!
//! Both solids are imported into one arena of vertices, edges and faces so
//! that intersection points can be welded across them. Faces are never
//! removed: replacing a face retires it with a [`FaceTag`] and appends its
//! fragments, so face indices stay valid for the whole operation.
//!
//! Adjacency is kept in both directions: every vertex lists its edges and
//! every edge lists the live faces bordering it. All mutation goes through
//! [`IndexedMesh`] methods, which keep the two sides consistent.

pub mod edge;
pub mod face;
pub mod manifold;
pub mod vertex;

pub use edge::Edge;
pub use face::{Face, FaceVertices};
pub use vertex::Vertex;

use crate::aabb::Aabb;
use crate::errors::{BooleanOpError, BooleanResult};
use crate::float_types::{Real, tolerance};
use crate::plane::Plane;
use crate::solid::{FaceRecord, FaceSource, Operand};
use crate::tag::{FaceTag, VertexTag};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use std::ops::Range;
use tracing::{debug, trace};

pub type VertexId = usize;
pub type EdgeId = usize;
pub type FaceId = usize;

type GridKey = [i64; 3];

/// Index ranges occupied by one imported operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRange {
    pub operand: Operand,
    pub vertices: Range<VertexId>,
    pub faces: Range<FaceId>,
}

#[derive(Debug, Clone, Default)]
pub struct IndexedMesh {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    /// Provenance of each imported face, indexed by `Face::original_face`
    sources: Vec<FaceSource>,
    /// Corners of each imported face before quads were split, same indexing
    outlines: Vec<FaceVertices>,
    /// Uniform grid over vertex positions for welding
    weld_grid: HashMap<GridKey, Vec<VertexId>>,
}

impl IndexedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one operand as a contiguous range of vertices and faces.
    ///
    /// Face records index the operand's own vertex enumeration; quads are
    /// split along their `0-2` diagonal. Degenerate triangles are kept for
    /// provenance but enter the mesh already tagged [`FaceTag::Phantom`].
    pub fn import_solid<F, V>(&mut self, operand: Operand, faces: F, vertices: V) -> BooleanResult<ImportRange>
    where
        F: IntoIterator<Item = FaceRecord>,
        V: IntoIterator<Item = Point3<Real>>,
    {
        let first_vertex = self.vertices.len();
        for point in vertices {
            self.add_vertex(point);
        }
        let vertex_count = self.vertices.len() - first_vertex;
        if vertex_count == 0 {
            return Err(BooleanOpError::EmptyMesh { operand });
        }

        let first_face = self.faces.len();
        for (face_index, record) in faces.into_iter().enumerate() {
            if let Some(&vertex) = record.vertices.as_slice().iter().find(|&&v| v >= vertex_count) {
                return Err(BooleanOpError::InvalidFace {
                    operand,
                    face: face_index,
                    vertex,
                    vertex_count,
                });
            }

            let original = self.sources.len();
            self.sources.push(FaceSource {
                operand,
                original_face: record.original_face,
            });

            let at = |k: usize| first_vertex + record.vertices.as_slice()[k];
            self.outlines.push(match record.vertices {
                FaceVertices::Triangle(_) => FaceVertices::Triangle([at(0), at(1), at(2)]),
                FaceVertices::Quad(_) => FaceVertices::Quad([at(0), at(1), at(2), at(3)]),
            });
            match record.vertices {
                FaceVertices::Triangle(_) => {
                    self.import_triangle([at(0), at(1), at(2)], original);
                },
                FaceVertices::Quad(_) => {
                    self.import_triangle([at(0), at(1), at(2)], original);
                    self.import_triangle([at(0), at(2), at(3)], original);
                },
            }
        }

        debug!(
            %operand,
            vertices = vertex_count,
            faces = self.faces.len() - first_face,
            "imported operand"
        );
        Ok(ImportRange {
            operand,
            vertices: first_vertex..self.vertices.len(),
            faces: first_face..self.faces.len(),
        })
    }

    fn import_triangle(&mut self, corners: [VertexId; 3], original: FaceId) -> FaceId {
        let [a, b, c] = corners.map(|v| self.vertices[v].point);
        let vertices = FaceVertices::Triangle(corners);
        let face = match Plane::from_points(&a, &b, &c) {
            Some(plane) if !vertices.has_repeats() => Face::new(vertices, plane, original),
            _ => {
                debug!(?corners, original, "degenerate input triangle");
                Face::new(vertices, Plane::from_normal(Vector3::z(), 0.0), original)
                    .with_tag(FaceTag::Phantom)
            },
        };
        self.add_face(face)
    }

    // ---- vertices -------------------------------------------------------

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    #[inline]
    pub fn point(&self, v: VertexId) -> Point3<Real> {
        self.vertices[v].point
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Adds a vertex without looking for an existing one.
    pub fn add_vertex(&mut self, point: Point3<Real>) -> VertexId {
        let id = self.vertices.len();
        self.vertices.push(Vertex::new(point));
        self.weld_grid.entry(grid_key(&point)).or_default().push(id);
        id
    }

    /// Closest live vertex within tolerance of `point`.
    pub fn find_vertex(&self, point: &Point3<Real>) -> Option<VertexId> {
        let eps = tolerance();
        let [x, y, z] = grid_key(point);
        let mut best: Option<(VertexId, Real)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(cell) = self.weld_grid.get(&[x + dx, y + dy, z + dz]) else {
                        continue;
                    };
                    for &v in cell {
                        let distance = (self.vertices[v].point - point).norm();
                        if distance < eps && best.is_none_or(|(_, d)| distance < d) {
                            best = Some((v, distance));
                        }
                    }
                }
            }
        }
        best.map(|(v, _)| v)
    }

    /// Welds `point` to an existing vertex or creates a new one.
    pub fn find_or_add_vertex(&mut self, point: Point3<Real>) -> VertexId {
        match self.find_vertex(&point) {
            Some(v) => v,
            None => self.add_vertex(point),
        }
    }

    pub(crate) fn set_vertex_tag(&mut self, v: VertexId, tag: VertexTag) {
        self.vertices[v].tag = tag;
        if tag == VertexTag::Broken {
            self.unregister(v);
        }
    }

    fn unregister(&mut self, v: VertexId) {
        let key = grid_key(&self.vertices[v].point);
        if let Some(cell) = self.weld_grid.get_mut(&key) {
            cell.retain(|&x| x != v);
        }
    }

    /// Merges `remove` into `keep`, rewriting every incident edge and face.
    ///
    /// Edges that become duplicates are folded together; faces that collapse
    /// (they contained both vertices) are retired as [`FaceTag::Phantom`].
    /// Returns the surviving vertex.
    pub fn merge_vertices(&mut self, keep: VertexId, remove: VertexId) -> VertexId {
        if keep == remove || self.vertices[remove].is_broken() {
            return keep;
        }
        trace!(keep, remove, "merging coincident vertices");

        let mut touched = Vec::new();
        for e in self.vertices[remove].take_edges() {
            touched.extend_from_slice(self.edges[e].faces());
            let Some(other) = self.edges[e].opposite(remove) else {
                continue;
            };
            if other == keep {
                self.vertices[keep].remove_edge(e);
                self.edges[e].take_faces();
                continue;
            }
            match self.get_edge(keep, other) {
                Some(existing) => {
                    for f in self.edges[e].take_faces() {
                        self.edges[existing].add_face(f);
                    }
                    self.vertices[other].remove_edge(e);
                },
                None => {
                    self.edges[e].replace_vertex(remove, keep);
                    self.vertices[keep].add_edge(e);
                },
            }
        }

        touched.sort_unstable();
        touched.dedup();
        for f in touched {
            self.faces[f].replace_vertex(remove, keep);
            if self.faces[f].vertices().has_repeats() {
                self.detach_face(f);
                self.faces[f].tag = FaceTag::Phantom;
            }
        }
        self.set_vertex_tag(remove, VertexTag::Broken);
        self.vertices[remove].set_merged_into(keep);
        keep
    }

    /// Follows merges from `v` to the vertex that replaced it.
    ///
    /// Retired faces keep the corner ids they had when they were retired;
    /// this maps such ids onto live vertices.
    pub fn canonical_vertex(&self, mut v: VertexId) -> VertexId {
        while let Some(next) = self.vertices[v].merged_into() {
            v = next;
        }
        v
    }

    // ---- edges ----------------------------------------------------------

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[inline]
    pub fn edge(&self, e: EdgeId) -> &Edge {
        &self.edges[e]
    }

    /// Edge joining `a` and `b`, in either direction.
    pub fn get_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertices[a]
            .edges()
            .iter()
            .copied()
            .find(|&e| self.edges[e].opposite(a) == Some(b))
    }

    fn get_or_add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        if let Some(e) = self.get_edge(a, b) {
            return e;
        }
        let id = self.edges.len();
        self.edges.push(Edge::new(a, b));
        self.vertices[a].add_edge(id);
        self.vertices[b].add_edge(id);
        id
    }

    /// Live faces bordering the edge `a b`.
    pub fn faces_of_edge(&self, a: VertexId, b: VertexId) -> Vec<FaceId> {
        self.get_edge(a, b)
            .map(|e| self.edges[e].faces().to_vec())
            .unwrap_or_default()
    }

    // ---- faces ----------------------------------------------------------

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f]
    }

    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn live_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, face)| !face.is_retired())
            .map(|(f, _)| f)
    }

    /// Provenance of the imported face `original`.
    #[inline]
    pub fn source(&self, original: FaceId) -> FaceSource {
        self.sources[original]
    }

    /// Corners of the imported face `original`, following vertex merges.
    pub fn outline(&self, original: FaceId) -> Vec<VertexId> {
        self.outlines[original]
            .as_slice()
            .iter()
            .map(|&v| self.canonical_vertex(v))
            .collect()
    }

    /// Live faces descending from the imported face `original`.
    pub fn fragments_of(&self, original: FaceId) -> impl Iterator<Item = FaceId> + '_ {
        self.live_faces()
            .filter(move |&f| self.faces[f].original_face() == original)
    }

    #[inline]
    pub fn operand_of(&self, f: FaceId) -> Operand {
        self.sources[self.faces[f].original_face()].operand
    }

    pub fn face_points(&self, f: FaceId) -> Vec<Point3<Real>> {
        self.faces[f].points(&self.vertices)
    }

    /// Corner positions of a triangular face.
    pub fn triangle_points(&self, f: FaceId) -> Option<[Point3<Real>; 3]> {
        let [a, b, c] = self.faces[f].triangle()?;
        Some([self.point(a), self.point(b), self.point(c)])
    }

    #[inline]
    pub fn face_bbox(&self, f: FaceId) -> Aabb {
        self.faces[f].bounding_box(&self.vertices)
    }

    /// Adds a face and registers it on its edges unless it is already retired.
    pub fn add_face(&mut self, face: Face) -> FaceId {
        let id = self.faces.len();
        if !face.is_retired() {
            let edges: Vec<_> = face.edges().collect();
            for (a, b) in edges {
                let e = self.get_or_add_edge(a, b);
                self.edges[e].add_face(id);
            }
        }
        self.faces.push(face);
        id
    }

    /// Sets a face's tag; retiring tags also detach the face from its edges.
    pub fn set_face_tag(&mut self, f: FaceId, tag: FaceTag) {
        if tag.is_retired() && !self.faces[f].is_retired() {
            self.detach_face(f);
        }
        self.faces[f].tag = tag;
    }

    fn detach_face(&mut self, f: FaceId) {
        let edges: Vec<_> = self.faces[f].edges().collect();
        for (a, b) in edges {
            if let Some(e) = self.get_edge(a, b) {
                self.edges[e].remove_face(f);
            }
        }
    }

    /// Live faces having `v` as a corner.
    pub fn faces_around_vertex(&self, v: VertexId) -> Vec<FaceId> {
        let mut faces: Vec<FaceId> = self.vertices[v]
            .edges()
            .iter()
            .flat_map(|&e| self.edges[e].faces().iter().copied())
            .collect();
        faces.sort_unstable();
        faces.dedup();
        faces
    }

    /// Live faces with exactly the corners of `corners`, in any order.
    pub fn find_face_with_corners(&self, corners: &[VertexId]) -> Option<FaceId> {
        let first = *corners.first()?;
        self.faces_around_vertex(first).into_iter().find(|&f| {
            let indices = self.faces[f].indices();
            indices.len() == corners.len() && corners.iter().all(|v| indices.contains(v))
        })
    }

    /// Reverses a face's winding and plane. Edges are undirected and stay.
    pub fn invert_face(&mut self, f: FaceId) {
        self.faces[f].invert();
    }
}

#[inline]
fn grid_key(p: &Point3<Real>) -> GridKey {
    let cell = 2.0 * tolerance();
    [
        (p.x / cell).floor() as i64,
        (p.y / cell).floor() as i64,
        (p.z / cell).floor() as i64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mesh() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        mesh.import_solid(Operand::A, [FaceRecord::quad([0, 1, 2, 3], 7)], vertices)
            .unwrap();
        mesh
    }

    #[test]
    fn quads_import_as_two_triangles() {
        let mesh = square_mesh();
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face(0).indices(), &[0, 1, 2]);
        assert_eq!(mesh.face(1).indices(), &[0, 2, 3]);
        assert_eq!(mesh.face(0).original_face(), mesh.face(1).original_face());
        assert_eq!(mesh.source(0).original_face, 7);
        assert_eq!(mesh.outline(0), vec![0, 1, 2, 3]);
        assert_eq!(mesh.fragments_of(0).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(mesh.faces_of_edge(0, 2), vec![0, 1]);
        assert_eq!(mesh.faces_of_edge(1, 0), vec![0]);
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let mut mesh = IndexedMesh::new();
        let err = mesh
            .import_solid(
                Operand::B,
                [FaceRecord::triangle([0, 1, 5], 0)],
                vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            )
            .unwrap_err();
        assert!(matches!(err, BooleanOpError::InvalidFace { vertex: 5, .. }));
    }

    #[test]
    fn rejects_empty_operand() {
        let mut mesh = IndexedMesh::new();
        let err = mesh
            .import_solid(Operand::A, Vec::<FaceRecord>::new(), Vec::<Point3<Real>>::new())
            .unwrap_err();
        assert_eq!(err, BooleanOpError::EmptyMesh { operand: Operand::A });
    }

    #[test]
    fn degenerate_triangles_are_phantoms() {
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::triangle([0, 1, 1], 0), FaceRecord::triangle([0, 1, 2], 1)],
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
        )
        .unwrap();
        assert_eq!(mesh.face(0).tag, FaceTag::Phantom);
        assert_eq!(mesh.face(1).tag, FaceTag::Phantom);
        assert_eq!(mesh.live_faces().count(), 0);
    }

    #[test]
    fn welding_reuses_nearby_vertices() {
        let mut mesh = square_mesh();
        let eps = tolerance();
        let v = mesh.find_or_add_vertex(Point3::new(1.0 + eps * 0.25, 0.0, 0.0));
        assert_eq!(v, 1);
        let w = mesh.find_or_add_vertex(Point3::new(0.5, 0.5, 0.0));
        assert_eq!(w, 4);
        assert_eq!(mesh.find_vertex(&Point3::new(0.5, 0.5, eps * 0.5)), Some(4));
    }

    #[test]
    fn retiring_detaches_from_edges() {
        let mut mesh = square_mesh();
        mesh.set_face_tag(0, FaceTag::Broken);
        assert_eq!(mesh.faces_of_edge(0, 2), vec![1]);
        assert!(mesh.faces_of_edge(0, 1).is_empty());
        assert_eq!(mesh.live_faces().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn merging_vertices_rewires_adjacency() {
        let mut mesh = square_mesh();
        let dup = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let far = mesh.add_vertex(Point3::new(2.0, 1.0, 0.0));
        let plane = *mesh.face(0).plane();
        let f = mesh.add_face(Face::new(FaceVertices::Triangle([1, far, dup]), plane, 0));

        let kept = mesh.merge_vertices(2, dup);
        assert_eq!(kept, 2);
        assert!(mesh.vertex(dup).is_broken());
        assert_eq!(mesh.face(f).indices(), &[1, far, 2]);
        assert_eq!(mesh.faces_of_edge(1, 2), vec![0, f]);
        assert_eq!(mesh.faces_of_edge(far, 2), vec![f]);
        assert_eq!(mesh.find_vertex(&Point3::new(1.0, 1.0, 0.0)), Some(2));
        assert_eq!(mesh.canonical_vertex(dup), 2);
    }

    #[test]
    fn merging_collapses_faces_containing_both() {
        let mut mesh = square_mesh();
        mesh.merge_vertices(0, 1);
        assert_eq!(mesh.face(0).tag, FaceTag::Phantom);
        assert_eq!(mesh.face(1).tag, FaceTag::Unclassified);
        assert_eq!(mesh.faces_of_edge(0, 2), vec![1]);
    }
}
