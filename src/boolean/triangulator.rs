//! Inserting intersection points into triangles.
//!
//! A split request names a triangle and the two ends of an intersection
//! segment. Each end is located on the triangle (corner, edge, interior) and
//! inserted in turn:
//!
//! - on an edge, every live triangle bordering that edge is split in two,
//!   so neighbours stay conforming;
//! - in the interior, the triangle is fanned into three.
//!
//! Inserting both ends leaves the segment as an edge of the result. When two
//! insertion orders are possible the one giving the Delaunay diagonal wins.

use crate::float_types::tolerance;
use crate::math;
use crate::mesh::{Face, FaceId, FaceVertices, IndexedMesh, VertexId};
use crate::tag::FaceTag;
use std::iter;
use tracing::{debug, trace, warn};

/// Position of a vertex relative to a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Corner(usize),
    /// Strictly inside edge `k` (corner `k` to corner `k + 1`)
    Edge(usize),
    Interior,
    Outside,
}

/// Locates vertex `v` on triangle `face`.
///
/// A distinct vertex within tolerance of a corner reports that corner.
pub(crate) fn locate(mesh: &IndexedMesh, face: FaceId, v: VertexId) -> Location {
    let Some(corners) = mesh.face(face).triangle() else {
        return Location::Outside;
    };
    if let Some(k) = corners.iter().position(|&c| c == v) {
        return Location::Corner(k);
    }
    let p = mesh.point(v);
    let points = corners.map(|c| mesh.point(c));
    if let Some(k) = points.iter().position(|q| math::points_coincide(&p, q)) {
        return Location::Corner(k);
    }

    let eps = tolerance();
    let normal = mesh.face(face).plane().normal;
    let sides: [_; 3] = std::array::from_fn(|k| math::edge_side(&p, &points[k], &points[(k + 1) % 3], &normal));
    if sides.iter().any(|&s| s <= -eps) {
        return Location::Outside;
    }
    let nearest = (0..3)
        .filter(|&k| sides[k] < eps)
        .min_by(|&a, &b| sides[a].abs().total_cmp(&sides[b].abs()));
    match nearest {
        Some(k) if math::segment_contains(&p, &points[k], &points[(k + 1) % 3]) => Location::Edge(k),
        Some(_) => Location::Outside,
        None => Location::Interior,
    }
}

pub(crate) struct Triangulator<'m> {
    mesh: &'m mut IndexedMesh,
}

impl<'m> Triangulator<'m> {
    pub(crate) fn new(mesh: &'m mut IndexedMesh) -> Self {
        Self { mesh }
    }

    /// Splits `face` so that `v1 v2` becomes an edge (or `v1` a corner when
    /// both are the same vertex). Returns whether anything changed.
    pub(crate) fn split(&mut self, face: FaceId, v1: VertexId, v2: VertexId) -> bool {
        let Some(corners) = self.mesh.face(face).triangle() else {
            return false;
        };
        if self.mesh.face(face).is_retired() {
            return false;
        }
        if v1 == v2 {
            return self.insert_point(&[face], v1);
        }

        let order = match (locate(self.mesh, face, v1), locate(self.mesh, face, v2)) {
            (Location::Corner(_), Location::Corner(_)) => return false,
            (Location::Outside, Location::Outside) => {
                debug!(face, v1, v2, "split points outside triangle");
                return false;
            },
            (Location::Corner(_) | Location::Outside, _) => vec![v2],
            (_, Location::Corner(_) | Location::Outside) => vec![v1],
            (Location::Edge(k1), Location::Edge(k2)) if k1 != k2 => {
                if self.first_on_adjacent_edges(corners, (v1, k1), (v2, k2)) {
                    vec![v1, v2]
                } else {
                    vec![v2, v1]
                }
            },
            (Location::Edge(_), Location::Edge(_)) => vec![v1, v2],
            (Location::Edge(_), Location::Interior) => vec![v1, v2],
            (Location::Interior, Location::Edge(_)) => vec![v2, v1],
            (Location::Interior, Location::Interior) => {
                if self.interior_root_first(face, corners, v1, v2) {
                    vec![v1, v2]
                } else {
                    vec![v2, v1]
                }
            },
        };

        let original = self.mesh.face(face).original_face();
        let first_new = self.mesh.num_faces();
        let mut changed = false;
        for v in order {
            let family: Vec<FaceId> = iter::once(face)
                .chain(first_new..self.mesh.num_faces())
                .filter(|&f| {
                    let candidate = self.mesh.face(f);
                    !candidate.is_retired() && candidate.original_face() == original
                })
                .collect();
            changed |= self.insert_point(&family, v);
        }
        changed
    }

    /// Edge points on two different edges: inserting `a` first yields the
    /// diagonal from `a` to the far corner of `b`'s edge. Prefer it unless
    /// `b` falls inside that triangle's circumcircle.
    fn first_on_adjacent_edges(
        &self,
        corners: [VertexId; 3],
        (a, ka): (VertexId, usize),
        (b, kb): (VertexId, usize),
    ) -> bool {
        let ends = |k: usize| [corners[k], corners[(k + 1) % 3]];
        let (ea, eb) = (ends(ka), ends(kb));
        let Some(&shared) = ea.iter().find(|v| eb.contains(v)) else {
            return true;
        };
        let far_a = if ea[0] == shared { ea[1] } else { ea[0] };
        let far_b = if eb[0] == shared { eb[1] } else { eb[0] };
        let p = |v: VertexId| self.mesh.point(v);
        !math::is_inside_circle(&p(a), &p(far_a), &p(far_b), &p(b))
    }

    /// Two interior points: the first one inserted fans the triangle and the
    /// second lands in one of the fan triangles. Pick the root whose fan
    /// triangle around the other point keeps it outside its circumcircle.
    fn interior_root_first(&self, face: FaceId, corners: [VertexId; 3], v1: VertexId, v2: VertexId) -> bool {
        let p = |v: VertexId| self.mesh.point(v);
        let normal = self.mesh.face(face).plane().normal;
        let fan_violates = |root: VertexId, other: VertexId| {
            (0..3).any(|k| {
                let (a, b) = (p(corners[k]), p(corners[(k + 1) % 3]));
                math::point_in_triangle(&p(other), &a, &b, &p(root), &normal)
                    && math::is_inside_circle(&a, &b, &p(root), &p(other))
            })
        };
        !fan_violates(v1, v2) || fan_violates(v2, v1)
    }

    /// Inserts `v` into whichever face of `family` contains it.
    fn insert_point(&mut self, family: &[FaceId], v: VertexId) -> bool {
        for &f in family {
            if self.mesh.face(f).is_retired() {
                continue;
            }
            let Some(corners) = self.mesh.face(f).triangle() else {
                continue;
            };
            match locate(self.mesh, f, v) {
                Location::Corner(_) => return false,
                Location::Edge(k) => return self.split_edge(corners[k], corners[(k + 1) % 3], v),
                Location::Interior => {
                    let [a, b, c] = corners;
                    self.replace(f, &[[a, b, v], [b, c, v], [c, a, v]]);
                    return true;
                },
                Location::Outside => {},
            }
        }
        debug!(v, "point not located in any fragment");
        false
    }

    /// Splits every live triangle bordering edge `a b` at `v`.
    pub(crate) fn split_edge(&mut self, a: VertexId, b: VertexId, v: VertexId) -> bool {
        let faces = self.mesh.faces_of_edge(a, b);
        if faces.is_empty() {
            warn!(a, b, v, "edge lookup failed, split skipped");
            return false;
        }
        let mut changed = false;
        for f in faces {
            let Some(tri) = self.mesh.face(f).triangle() else {
                debug!(f, "edge split on a non-triangle skipped");
                continue;
            };
            if tri.contains(&v) {
                continue;
            }
            let Some(i) = (0..3).find(|&i| {
                let (x, y) = (tri[i], tri[(i + 1) % 3]);
                (x == a && y == b) || (x == b && y == a)
            }) else {
                continue;
            };
            let (p, q, r) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
            self.replace(f, &[[p, v, r], [v, q, r]]);
            changed = true;
        }
        changed
    }

    /// Retires `parent` and adds `children` in its place.
    ///
    /// Children inherit plane, provenance and classification. A child that
    /// duplicates a live face is dropped; a near-degenerate child is kept as
    /// a phantom.
    fn replace(&mut self, parent: FaceId, children: &[[VertexId; 3]]) {
        let plane = *self.mesh.face(parent).plane();
        let original = self.mesh.face(parent).original_face();
        let tag = self.mesh.face(parent).tag;
        self.mesh.set_face_tag(parent, FaceTag::Broken);
        trace!(parent, children = children.len(), "splitting face");

        for &child in children {
            if self.mesh.find_face_with_corners(&child).is_some() {
                debug!(?child, "duplicate fragment dropped");
                continue;
            }
            let [a, b, c] = child.map(|v| self.mesh.point(v));
            let child_tag = if math::collinear(&a, &b, &c) {
                FaceTag::Phantom
            } else {
                tag
            };
            self.mesh
                .add_face(Face::new(FaceVertices::Triangle(child), plane, original).with_tag(child_tag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid::{FaceRecord, Operand};
    use nalgebra::Point3;

    /// Two triangles sharing the edge 1-2: (0,1,2) and (1,3,2).
    fn strip() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.import_solid(
            Operand::A,
            [FaceRecord::triangle([0, 1, 2], 0), FaceRecord::triangle([1, 3, 2], 1)],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
            ],
        )
        .unwrap();
        mesh
    }

    fn live_triangles(mesh: &IndexedMesh) -> usize {
        mesh.live_faces().count()
    }

    #[test]
    fn locating_points() {
        let mut mesh = strip();
        let mid_edge = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let inside = mesh.add_vertex(Point3::new(0.5, 0.5, 0.0));
        let outside = mesh.add_vertex(Point3::new(1.5, 1.5, 0.0));
        assert_eq!(locate(&mesh, 0, 1), Location::Corner(1));
        assert_eq!(locate(&mesh, 0, mid_edge), Location::Edge(1));
        assert_eq!(locate(&mesh, 0, inside), Location::Interior);
        assert_eq!(locate(&mesh, 0, outside), Location::Outside);
    }

    #[test]
    fn edge_split_propagates_to_neighbour() {
        let mut mesh = strip();
        let mid = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        assert!(Triangulator::new(&mut mesh).split_edge(1, 2, mid));
        assert_eq!(live_triangles(&mesh), 4);
        assert_eq!(mesh.faces_of_edge(1, mid).len(), 2);
        assert_eq!(mesh.faces_of_edge(mid, 2).len(), 2);
        assert!(mesh.faces_of_edge(1, 2).is_empty());
        for f in mesh.live_faces() {
            let [a, b, c] = mesh.triangle_points(f).unwrap();
            assert!((b - a).cross(&(c - a)).z > 0.0, "fragment {f} flipped");
        }
    }

    #[test]
    fn interior_segment_becomes_an_edge() {
        let mut mesh = strip();
        let p = mesh.add_vertex(Point3::new(0.3, 0.4, 0.0));
        let q = mesh.add_vertex(Point3::new(0.6, 0.3, 0.0));
        assert!(Triangulator::new(&mut mesh).split(0, p, q));
        assert_eq!(live_triangles(&mesh), 1 + 5);
        assert!(!mesh.faces_of_edge(p, q).is_empty());
    }

    #[test]
    fn crossing_segment_splits_both_edges() {
        let mut mesh = strip();
        let on_bottom = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let on_left = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        assert!(Triangulator::new(&mut mesh).split(0, on_bottom, on_left));
        assert_eq!(mesh.faces_of_edge(on_bottom, on_left).len(), 2);
        assert_eq!(live_triangles(&mesh), 1 + 3);
    }

    #[test]
    fn corner_to_corner_is_a_no_op() {
        let mut mesh = strip();
        assert!(!Triangulator::new(&mut mesh).split(0, 1, 2));
        assert_eq!(live_triangles(&mesh), 2);
    }

    #[test]
    fn fragments_inherit_classification() {
        let mut mesh = strip();
        mesh.set_face_tag(1, FaceTag::In);
        let mid = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        Triangulator::new(&mut mesh).split_edge(1, 2, mid);
        let tags: Vec<_> = mesh
            .live_faces()
            .filter(|&f| mesh.face(f).original_face() == 1)
            .map(|f| mesh.face(f).tag)
            .collect();
        assert_eq!(tags, vec![FaceTag::In, FaceTag::In]);
    }
}
