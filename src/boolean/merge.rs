//! Post-pass that undoes needless fragmentation.
//!
//! Cutting leaves vertices that no longer sit on a crease: points in the
//! middle of a flat region, or on a straight seam between two flat regions.
//! Such a vertex is removed when the outline left by its faces is convex:
//! the outline becomes one triangle or quad, or a fan of triangles. Pairs of
//! triangles from the same input face are then joined into convex quads.
//!
//! Only vertices created during the operation are candidates; input vertices
//! are always preserved.

use crate::math;
use crate::mesh::{Face, FaceId, FaceVertices, IndexedMesh, VertexId};
use crate::plane::Plane;
use crate::tag::{FaceTag, VertexTag};
use std::collections::BTreeMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub vertices_removed: usize,
    pub quads_formed: usize,
}

/// Corners seen from a vertex, in winding order, with the vertex itself left
/// out. Closed when the faces surround the vertex completely.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fan {
    corners: Vec<VertexId>,
    closed: bool,
}

/// Faces around a vertex that came from one input face.
struct Group {
    faces: Vec<FaceId>,
    fan: Fan,
    plane: Plane,
    original: FaceId,
    tag: FaceTag,
}

pub struct Merger<'m> {
    mesh: &'m mut IndexedMesh,
    first_new_vertex: VertexId,
}

impl<'m> Merger<'m> {
    /// `first_new_vertex` is the number of vertices the operands brought in.
    pub fn new(mesh: &'m mut IndexedMesh, first_new_vertex: VertexId) -> Self {
        Self { mesh, first_new_vertex }
    }

    pub fn run(mut self) -> MergeStats {
        let mut stats = MergeStats::default();
        loop {
            loop {
                let removed = self.remove_vertices();
                stats.vertices_removed += removed;
                if removed == 0 {
                    break;
                }
            }
            let quads = self.pair_triangles();
            stats.quads_formed += quads;
            if quads == 0 {
                break;
            }
        }
        stats
    }

    fn remove_vertices(&mut self) -> usize {
        (self.first_new_vertex..self.mesh.num_vertices())
            .filter(|&v| self.try_remove_vertex(v))
            .count()
    }

    /// Removes `v` if it is flat: surrounded by one input face, or lying on
    /// a straight seam between two.
    pub fn try_remove_vertex(&mut self, v: VertexId) -> bool {
        if v < self.first_new_vertex || self.mesh.vertex(v).is_broken() {
            return false;
        }
        let faces = self.mesh.faces_around_vertex(v);
        if faces.is_empty() {
            return false;
        }

        let mut by_original: BTreeMap<FaceId, Vec<FaceId>> = BTreeMap::new();
        for f in faces {
            by_original
                .entry(self.mesh.face(f).original_face())
                .or_default()
                .push(f);
        }
        if by_original.len() > 2 {
            return false;
        }

        let mut groups = Vec::with_capacity(by_original.len());
        for (original, faces) in by_original {
            let Some(fan) = self.fan(v, &faces) else {
                return false;
            };
            let face = self.mesh.face(faces[0]);
            groups.push(Group {
                plane: *face.plane(),
                tag: face.tag,
                original,
                faces,
                fan,
            });
        }

        let removable = match groups.as_slice() {
            [only] => only.fan.closed,
            [g1, g2] => self.is_straight_seam(v, &g1.fan, &g2.fan),
            _ => false,
        };
        if !removable {
            return false;
        }
        let Some(replacements) = groups
            .iter()
            .map(|g| self.replacement(g))
            .collect::<Option<Vec<_>>>()
        else {
            return false;
        };

        trace!(v, groups = groups.len(), "removing flat vertex");
        for group in &groups {
            for &f in &group.faces {
                self.mesh.set_face_tag(f, FaceTag::Broken);
            }
        }
        for (group, faces) in groups.iter().zip(replacements) {
            for vertices in faces {
                self.mesh
                    .add_face(Face::new(vertices, group.plane, group.original).with_tag(group.tag));
            }
        }
        self.mesh.set_vertex_tag(v, VertexTag::Broken);
        true
    }

    /// Chains the faces of one group into a fan around `v`.
    ///
    /// `None` when the faces do not form a single fan.
    fn fan(&self, v: VertexId, faces: &[FaceId]) -> Option<Fan> {
        let mut arcs: Vec<Vec<VertexId>> = faces
            .iter()
            .map(|&f| {
                let indices = self.mesh.face(f).indices();
                let n = indices.len();
                let at = indices.iter().position(|&x| x == v)?;
                Some((1..n).map(|k| indices[(at + k) % n]).collect())
            })
            .collect::<Option<_>>()?;

        let start = (0..arcs.len())
            .find(|&i| !arcs.iter().any(|other| other.last() == arcs[i].first()))
            .unwrap_or(0);
        let mut corners = arcs.swap_remove(start);
        while !arcs.is_empty() {
            let last = corners.last().copied();
            let next = arcs.iter().position(|arc| arc.first().copied() == last)?;
            let arc = arcs.swap_remove(next);
            corners.extend_from_slice(&arc[1..]);
        }

        let closed = corners.len() > 2 && corners.first() == corners.last();
        if closed {
            corners.pop();
        }
        if corners.iter().enumerate().any(|(i, c)| corners[i + 1..].contains(c)) {
            return None;
        }
        Some(Fan { corners, closed })
    }

    /// Two open fans meeting at both ends, with `v` strictly inside the
    /// straight segment between those ends.
    fn is_straight_seam(&self, v: VertexId, g1: &Fan, g2: &Fan) -> bool {
        if g1.closed || g2.closed {
            return false;
        }
        let (Some(&u), Some(&w)) = (g1.corners.first(), g1.corners.last()) else {
            return false;
        };
        if g2.corners.first() != Some(&w) || g2.corners.last() != Some(&u) {
            return false;
        }
        let (pu, pv, pw) = (self.mesh.point(u), self.mesh.point(v), self.mesh.point(w));
        math::collinear(&pu, &pv, &pw) && math::segment_contains(&pv, &pu, &pw)
    }

    /// Faces covering the outline of a fan once its centre is gone.
    ///
    /// A strictly convex triangle or quad stays whole. Any other convex
    /// outline, straight corners included, is fanned from the first corner
    /// that yields no sliver. `None` when the outline is not convex.
    fn replacement(&self, group: &Group) -> Option<Vec<FaceVertices>> {
        let corners = &group.fan.corners;
        let points: Vec<_> = corners.iter().map(|&c| self.mesh.point(c)).collect();
        let normal = &group.plane.normal;
        if corners.len() <= 4 && math::is_convex_polygon(&points, normal) {
            return FaceVertices::from_slice(corners).map(|f| vec![f]);
        }
        if !math::is_weakly_convex_polygon(&points, normal) {
            return None;
        }

        let n = corners.len();
        (0..n).find_map(|root| {
            let fan: Vec<[usize; 3]> = (1..n - 1)
                .map(|k| [root, (root + k) % n, (root + k + 1) % n])
                .collect();
            fan.iter()
                .all(|t| !math::collinear(&points[t[0]], &points[t[1]], &points[t[2]]))
                .then(|| {
                    fan.iter()
                        .map(|t| FaceVertices::Triangle(t.map(|i| corners[i])))
                        .collect()
                })
        })
    }

    /// Joins triangles sharing an edge into a quad when both come from the
    /// same input face and the quad is strictly convex.
    fn pair_triangles(&mut self) -> usize {
        let triangles: Vec<FaceId> = self
            .mesh
            .live_faces()
            .filter(|&f| self.mesh.face(f).is_triangle())
            .collect();

        let mut formed = 0;
        for f in triangles {
            if let Some(quad) = self.quad_partner(f) {
                let (g, corners) = quad;
                let face = self.mesh.face(f);
                let (plane, original, tag) = (*face.plane(), face.original_face(), face.tag);
                self.mesh.set_face_tag(f, FaceTag::Broken);
                self.mesh.set_face_tag(g, FaceTag::Broken);
                self.mesh
                    .add_face(Face::new(FaceVertices::Quad(corners), plane, original).with_tag(tag));
                formed += 1;
            }
        }
        formed
    }

    fn quad_partner(&self, f: FaceId) -> Option<(FaceId, [VertexId; 4])> {
        let face = self.mesh.face(f);
        if face.is_retired() {
            return None;
        }
        let tri = face.triangle()?;
        (0..3).find_map(|k| {
            let (a, b, c) = (tri[k], tri[(k + 1) % 3], tri[(k + 2) % 3]);
            let neighbours = self.mesh.faces_of_edge(a, b);
            let [x, y] = neighbours.as_slice() else {
                return None;
            };
            let g = if *x == f { *y } else { *x };
            let other = self.mesh.face(g);
            if other.original_face() != face.original_face() || other.tag != face.tag {
                return None;
            }
            let d = other.triangle()?.into_iter().find(|&corner| corner != a && corner != b)?;
            let corners = [a, d, b, c];
            let points = corners.map(|v| self.mesh.point(v));
            math::is_convex_polygon(&points, &face.plane().normal).then_some((g, corners))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::Real;
    use crate::solid::{FaceRecord, Operand};
    use nalgebra::Point3;

    /// Unit square in z = 0 fanned around an added centre vertex.
    fn fanned_square() -> (IndexedMesh, VertexId) {
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::quad([0, 1, 2, 3], 0)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        let centre = mesh.add_vertex(Point3::new(0.5, 0.5, 0.0));
        let plane = *mesh.face(0).plane();
        let original = mesh.face(0).original_face();
        mesh.set_face_tag(0, FaceTag::Broken);
        mesh.set_face_tag(1, FaceTag::Broken);
        for k in 0..4 {
            let tri = [k, (k + 1) % 4, centre];
            mesh.add_face(Face::new(FaceVertices::Triangle(tri), plane, original).with_tag(FaceTag::In));
        }
        (mesh, centre)
    }

    #[test]
    fn interior_vertex_is_removed() {
        let (mut mesh, centre) = fanned_square();
        let stats = Merger::new(&mut mesh, 4).run();
        assert_eq!(stats.vertices_removed, 1);
        assert!(mesh.vertex(centre).is_broken());

        let live: Vec<_> = mesh.live_faces().collect();
        assert_eq!(live.len(), 1);
        let quad = mesh.face(live[0]);
        assert_eq!(quad.indices().len(), 4);
        assert!(quad.plane().normal.z > 0.0);
        assert_eq!(quad.tag, FaceTag::In);
    }

    #[test]
    fn input_vertices_are_kept() {
        let (mut mesh, centre) = fanned_square();
        let stats = Merger::new(&mut mesh, centre + 1).run();
        assert_eq!(stats.vertices_removed, 0);
        assert!(!mesh.vertex(centre).is_broken());
    }

    #[test]
    fn seam_vertex_between_two_faces_is_removed() {
        // Two coplanar squares from different input faces, sharing the edge
        // x = 1, with a cut vertex in the middle of that edge.
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::quad([0, 1, 2, 3], 0), FaceRecord::quad([1, 4, 5, 2], 1)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        let mid = mesh.add_vertex(Point3::new(1.0, 0.5, 0.0));
        for f in 0..4 {
            let face = mesh.face(f).clone();
            mesh.set_face_tag(f, FaceTag::Broken);
            let mut tri = face.triangle().unwrap();
            // Split the edge 1-2 at `mid`
            if let Some(i) = (0..3).find(|&i| {
                let (x, y) = (tri[i], tri[(i + 1) % 3]);
                (x, y) == (1, 2) || (x, y) == (2, 1)
            }) {
                let (p, q, r) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
                tri = [p, mid, r];
                let extra = [mid, q, r];
                mesh.add_face(Face::new(FaceVertices::Triangle(extra), *face.plane(), face.original_face()));
            }
            mesh.add_face(Face::new(FaceVertices::Triangle(tri), *face.plane(), face.original_face()));
        }
        assert_eq!(mesh.faces_around_vertex(mid).len(), 4);

        let mut merger = Merger::new(&mut mesh, mid);
        assert!(merger.try_remove_vertex(mid));
        assert!(mesh.vertex(mid).is_broken());
        assert_eq!(mesh.faces_of_edge(1, 2).len(), 2);
        assert!(mesh.live_faces().all(|f| !mesh.face(f).indices().contains(&mid)));
    }

    #[test]
    fn straight_corner_outline_is_fanned() {
        // The centre's outline has five corners, one of them the straight
        // corner at (0.5, 0).
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::quad([0, 1, 2, 3], 0)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        let side = mesh.add_vertex(Point3::new(0.5, 0.0, 0.0));
        let centre = mesh.add_vertex(Point3::new(0.5, 0.5, 0.0));
        let plane = *mesh.face(0).plane();
        let original = mesh.face(0).original_face();
        mesh.set_face_tag(0, FaceTag::Broken);
        mesh.set_face_tag(1, FaceTag::Broken);
        for tri in [[0, side, centre], [side, 1, centre], [1, 2, centre], [2, 3, centre], [3, 0, centre]] {
            mesh.add_face(Face::new(FaceVertices::Triangle(tri), plane, original).with_tag(FaceTag::In));
        }

        let stats = Merger::new(&mut mesh, centre).run();
        assert_eq!(stats.vertices_removed, 1);
        assert!(mesh.vertex(centre).is_broken());
        assert!(!mesh.vertex(side).is_broken());

        let live: Vec<_> = mesh.live_faces().collect();
        assert_eq!(live.len(), 2);
        let area: Real = live
            .iter()
            .map(|&f| {
                let p = mesh.face_points(f);
                (1..p.len() - 1)
                    .map(|k| math::triangle_area(&p[0], &p[k], &p[k + 1]))
                    .sum::<Real>()
            })
            .sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn crease_vertex_is_kept() {
        // A vertex where three input faces meet is never flat.
        let mut mesh = IndexedMesh::new();
        let corner = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let x = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let y = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let z = mesh.add_vertex(Point3::new(0.0, 0.0, 1.0));
        for (i, tri) in [[corner, y, x], [corner, x, z], [corner, z, y]].into_iter().enumerate() {
            let [a, b, c] = tri.map(|v| mesh.point(v));
            let plane = Plane::from_points(&a, &b, &c).unwrap();
            mesh.add_face(Face::new(FaceVertices::Triangle(tri), plane, i));
        }
        let mut merger = Merger::new(&mut mesh, 0);
        assert!(!merger.try_remove_vertex(corner));
    }

    #[test]
    fn triangles_pair_into_quad() {
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::quad([0, 1, 2, 3], 0)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        let stats = Merger::new(&mut mesh, 4).run();
        assert_eq!(stats.quads_formed, 1);
        let live: Vec<_> = mesh.live_faces().collect();
        assert_eq!(live.len(), 1);
        let mut corners = mesh.face(live[0]).indices().to_vec();
        corners.sort_unstable();
        assert_eq!(corners, vec![0, 1, 2, 3]);
    }
}
