//! Intersection of a triangle with a plane.

use crate::float_types::Real;
use crate::mesh::{FaceId, IndexedMesh, VertexId};
use crate::plane::Plane;
use crate::tag::PointClass;
use nalgebra::Point3;

/// Where a segment endpoint sits on its triangle.
///
/// Edge `k` joins corner `k` to corner `(k + 1) % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Undefined,
    Vertex(usize),
    Edge(usize),
    Interior,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentEnd {
    pub kind: Endpoint,
    pub point: Point3<Real>,
    /// Mesh vertex for [`Endpoint::Vertex`] ends
    pub vertex: Option<VertexId>,
}

/// Part of a triangle cut out by a plane, possibly a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: SegmentEnd,
    pub end: SegmentEnd,
}

/// Index of the triangle edge joining corners `i` and `j`.
#[inline]
pub const fn edge_index(i: usize, j: usize) -> usize {
    if (i + 1) % 3 == j { i } else { j }
}

impl Segment {
    /// Intersection of triangle `face` with `plane`.
    ///
    /// `None` when the triangle misses the plane or lies in it.
    pub fn split_face(mesh: &IndexedMesh, face: FaceId, plane: &Plane) -> Option<Segment> {
        let corners = mesh.face(face).triangle()?.map(|v| mesh.canonical_vertex(v));
        let points = corners.map(|v| mesh.point(v));
        let classes = plane.classify_triangle(&points[0], &points[1], &points[2]);
        let on = classes.count(PointClass::On);
        let inside = classes.count(PointClass::In);
        let outside = classes.count(PointClass::Out);

        let corner = |k: usize| SegmentEnd {
            kind: Endpoint::Vertex(k),
            point: points[k],
            vertex: Some(corners[k]),
        };
        let crossing = |i: usize, j: usize| {
            // same edge, same arithmetic, whichever face asks
            let (p, q) = if corners[i] < corners[j] {
                (points[i], points[j])
            } else {
                (points[j], points[i])
            };
            SegmentEnd {
                kind: Endpoint::Edge(edge_index(i, j)),
                point: plane.intersect_segment(&p, &q),
                vertex: None,
            }
        };

        match (on, inside, outside) {
            (3, _, _) => None,
            (_, 0, _) | (_, _, 0) if on == 0 => None,
            (1, _, _) if inside == 0 || outside == 0 => {
                let k = classes.position(PointClass::On)?;
                Some(Segment {
                    start: corner(k),
                    end: corner(k),
                })
            },
            (2, _, _) => {
                let i = classes.position(PointClass::On)?;
                let j = (i + 1..3).find(|&j| classes.get(j) == PointClass::On)?;
                Some(Segment {
                    start: corner(i),
                    end: corner(j),
                })
            },
            (1, 1, 1) => {
                let k = classes.position(PointClass::On)?;
                let i = classes.position(PointClass::In)?;
                let o = classes.position(PointClass::Out)?;
                Some(Segment {
                    start: corner(k),
                    end: crossing(i, o),
                })
            },
            _ => {
                let lone_class = if inside == 1 {
                    PointClass::In
                } else {
                    PointClass::Out
                };
                let a = classes.position(lone_class)?;
                let (b, c) = ((a + 1) % 3, (a + 2) % 3);
                Some(Segment {
                    start: crossing(a, b),
                    end: crossing(a, c),
                })
            },
        }
    }

    /// Edge `k` of triangle `face`, from corner `k` to corner `k + 1`.
    pub fn edge_of(mesh: &IndexedMesh, face: FaceId, k: usize) -> Option<Segment> {
        let corners = mesh.face(face).triangle()?.map(|v| mesh.canonical_vertex(v));
        let end = |i: usize| SegmentEnd {
            kind: Endpoint::Vertex(i),
            point: mesh.point(corners[i]),
            vertex: Some(corners[i]),
        };
        Some(Segment {
            start: end(k % 3),
            end: end((k + 1) % 3),
        })
    }

    /// Kind of the points strictly between the two ends.
    pub fn interior_kind(&self) -> Endpoint {
        match (self.start.kind, self.end.kind) {
            (Endpoint::Vertex(i), Endpoint::Vertex(j)) if i != j => Endpoint::Edge(edge_index(i, j)),
            (Endpoint::Vertex(i), Endpoint::Vertex(_)) => Endpoint::Vertex(i),
            (Endpoint::Undefined, _) | (_, Endpoint::Undefined) => Endpoint::Undefined,
            _ => Endpoint::Interior,
        }
    }

    #[inline]
    pub fn length(&self) -> Real {
        (self.end.point - self.start.point).norm()
    }
}
