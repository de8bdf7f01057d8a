//! Pairwise intersection of candidate faces.
//!
//! For every candidate face of A against every candidate face of B whose
//! bounding boxes overlap:
//!
//! - **crossing planes**: each triangle is cut by the other's plane, the two
//!   cuts are intersected along the planes' common line, and the overlap is
//!   inserted into both triangles;
//! - **coplanar, same orientation**: the fragments of each input face are
//!   cut along the boundary of the other input face, once per pair of input
//!   faces, so the shared region ends up with the same outline on both sides;
//! - **coplanar, opposite orientation**: nothing is done, classification
//!   discards those faces.
//!
//! Fragments are appended to the candidate lists as they appear and are
//! themselves intersected later.

use super::segment::{Endpoint, Segment, SegmentEnd};
use super::triangulator::{Location, Triangulator, locate};
use crate::float_types::{Real, tolerance, tolerance_squared};
use crate::mesh::{FaceId, IndexedMesh, VertexId};
use crate::plane::Plane;
use crate::solid::Operand;
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use tracing::{debug, trace, warn};

/// Passes over one boundary edge before giving up on a stubborn fragment set.
const MAX_STITCH_PASSES: usize = 16;

/// One end of the overlap of two segments, described relative to both
/// triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OverlapEnd {
    on_a: Endpoint,
    vertex_a: Option<VertexId>,
    on_b: Endpoint,
    vertex_b: Option<VertexId>,
    point: Point3<Real>,
}

/// Overlap of two cuts lying on one line with direction `dir`.
///
/// `None` when they are disjoint or only share a point.
fn overlap(sa: &Segment, sb: &Segment, dir: &Vector3<Real>) -> Option<[OverlapEnd; 2]> {
    let eps = tolerance();
    let t = |end: &SegmentEnd| dir.dot(&end.point.coords);
    let ordered = |s: &Segment| {
        if t(&s.start) <= t(&s.end) {
            (s.start, s.end)
        } else {
            (s.end, s.start)
        }
    };
    let (a0, a1) = ordered(sa);
    let (b0, b1) = ordered(sb);

    let lo = t(&a0).max(t(&b0));
    let hi = t(&a1).min(t(&b1));
    if hi - lo < eps {
        return None;
    }

    let describe = |target: Real, defining: SegmentEnd| {
        let hit = |ends: [SegmentEnd; 2]| ends.into_iter().find(|e| (t(e) - target).abs() < eps);
        let a_hit = hit([a0, a1]);
        let b_hit = hit([b0, b1]);
        let point = [a_hit, b_hit]
            .into_iter()
            .flatten()
            .find(|e| matches!(e.kind, Endpoint::Vertex(_)))
            .unwrap_or(defining)
            .point;
        OverlapEnd {
            on_a: a_hit.map_or(sa.interior_kind(), |e| e.kind),
            vertex_a: a_hit.and_then(|e| e.vertex),
            on_b: b_hit.map_or(sb.interior_kind(), |e| e.kind),
            vertex_b: b_hit.and_then(|e| e.vertex),
            point,
        }
    };
    let low_end = if t(&a0) >= t(&b0) { a0 } else { b0 };
    let high_end = if t(&a1) <= t(&b1) { a1 } else { b1 };
    Some([describe(lo, low_end), describe(hi, high_end)])
}

pub(crate) struct FaceIntersector<'m> {
    mesh: &'m mut IndexedMesh,
    face_budget: usize,
    /// Pairs of imported faces (A, B) already stitched as coplanar
    stitched: HashSet<(FaceId, FaceId)>,
}

impl<'m> FaceIntersector<'m> {
    pub(crate) fn new(mesh: &'m mut IndexedMesh, face_budget: usize) -> Self {
        Self {
            mesh,
            face_budget,
            stitched: HashSet::new(),
        }
    }

    /// Intersects every live pair of candidates, growing both lists with
    /// the fragments produced. Returns `false` when the face budget ran out.
    pub(crate) fn run(&mut self, candidates_a: &mut Vec<FaceId>, candidates_b: &mut Vec<FaceId>) -> bool {
        let mut ia = 0;
        while ia < candidates_a.len() {
            let fa = candidates_a[ia];
            ia += 1;

            let mut ib = 0;
            while ib < candidates_b.len() && !self.mesh.face(fa).is_retired() {
                if self.mesh.num_faces() > self.face_budget {
                    warn!(
                        faces = self.mesh.num_faces(),
                        budget = self.face_budget,
                        "face budget exhausted, stopping intersection"
                    );
                    return false;
                }
                let fb = candidates_b[ib];
                ib += 1;
                if self.mesh.face(fb).is_retired() || !self.mesh.face_bbox(fa).intersects(&self.mesh.face_bbox(fb)) {
                    continue;
                }

                let before = self.mesh.num_faces();
                self.intersect_pair(fa, fb);
                for f in before..self.mesh.num_faces() {
                    let face = self.mesh.face(f);
                    if face.is_retired() || !face.tag.is_candidate() {
                        continue;
                    }
                    match self.mesh.operand_of(f) {
                        Operand::A => candidates_a.push(f),
                        Operand::B => candidates_b.push(f),
                    }
                }
            }
        }
        true
    }

    fn intersect_pair(&mut self, fa: FaceId, fb: FaceId) {
        let plane_a = *self.mesh.face(fa).plane();
        let plane_b = *self.mesh.face(fb).plane();
        let Some(points_a) = self.mesh.triangle_points(fa) else {
            return;
        };

        if points_a.iter().all(|p| plane_b.contains_point(p)) {
            if plane_a.same_orientation(&plane_b) {
                let originals = (self.mesh.face(fa).original_face(), self.mesh.face(fb).original_face());
                if self.stitched.insert(originals) {
                    trace!(fa, fb, "coplanar pair");
                    self.stitch(originals.0, originals.1, &plane_a);
                    self.stitch(originals.1, originals.0, &plane_a);
                }
            }
            return;
        }

        let Some(sa) = Segment::split_face(self.mesh, fa, &plane_b) else {
            return;
        };
        let Some(sb) = Segment::split_face(self.mesh, fb, &plane_a) else {
            return;
        };
        let Some(dir) = plane_a.normal.cross(&plane_b.normal).try_normalize(tolerance_squared()) else {
            return;
        };
        if let Some(ends) = overlap(&sa, &sb, &dir) {
            trace!(fa, fb, "crossing pair");
            self.insert_overlap(ends, &[fb, fa]);
        }
    }

    /// Cuts every fragment of imported face `target` along the boundary of
    /// the coplanar imported face `source`.
    ///
    /// Only the outline of `source` is used, never the edges of its
    /// fragments, so the cuts are fixed up front and the loop terminates.
    fn stitch(&mut self, source: FaceId, target: FaceId, plane: &Plane) {
        let outline = self.mesh.outline(source);
        let n = outline.len();
        for k in 0..n {
            let (u, w) = (outline[k], outline[(k + 1) % n]);
            let end = |index: usize, v: VertexId| SegmentEnd {
                kind: Endpoint::Vertex(index),
                point: self.mesh.point(v),
                vertex: Some(v),
            };
            let edge = Segment {
                start: end(0, u),
                end: end(1, w),
            };
            let along = edge.end.point - edge.start.point;
            let Some(dir) = along.try_normalize(tolerance_squared()) else {
                continue;
            };
            let Some(cut) = Plane::from_normal_and_point(along.cross(&plane.normal), &edge.start.point) else {
                continue;
            };

            let mut settled = false;
            for _ in 0..MAX_STITCH_PASSES {
                let fragments: Vec<FaceId> = self.mesh.fragments_of(target).collect();
                let mut changed = false;
                for f in fragments {
                    if self.mesh.face(f).is_retired() {
                        continue;
                    }
                    let Some(piece) = Segment::split_face(self.mesh, f, &cut) else {
                        continue;
                    };
                    if let Some(ends) = overlap(&edge, &piece, &dir) {
                        changed |= self.insert_overlap(ends, &[f]);
                    }
                }
                if !changed {
                    settled = true;
                    break;
                }
            }
            if !settled {
                debug!(source, target, edge = k, "coplanar stitch did not settle");
            }
        }
    }

    /// Resolves both overlap ends to mesh vertices and splits `targets`.
    /// Returns whether any target changed.
    fn insert_overlap(&mut self, ends: [OverlapEnd; 2], targets: &[FaceId]) -> bool {
        let (Some(mut v1), Some(mut v2)) = (self.resolve_vertex(&ends[0]), self.resolve_vertex(&ends[1])) else {
            return false;
        };
        let mut changed = false;
        for &f in targets {
            if self.mesh.face(f).is_retired() {
                trace!(f, "target already split");
                continue;
            }
            v1 = self.snap_to_corner(f, v1);
            v2 = self.snap_to_corner(f, v2);
            if v1 == v2 {
                return changed;
            }
            changed |= Triangulator::new(self.mesh).split(f, v1, v2);
        }
        changed
    }

    /// Picks or creates the vertex for one overlap end.
    ///
    /// Ends at an existing corner reuse it (two coincident corners are
    /// merged); ends on edges or inside a face get a welded new vertex.
    fn resolve_vertex(&mut self, end: &OverlapEnd) -> Option<VertexId> {
        use Endpoint::{Edge, Interior, Undefined, Vertex};
        match (end.on_a, end.on_b) {
            (Vertex(_), Vertex(_)) => match (end.vertex_a, end.vertex_b) {
                (Some(a), Some(b)) => Some(self.mesh.merge_vertices(a.min(b), a.max(b))),
                (a, b) => a.or(b),
            },
            (Vertex(_), Edge(_)) => end.vertex_a,
            (Vertex(_), Interior) => end.vertex_a,
            (Edge(_), Vertex(_)) => end.vertex_b,
            (Interior, Vertex(_)) => end.vertex_b,
            (Edge(_), Edge(_)) => Some(self.mesh.find_or_add_vertex(end.point)),
            (Edge(_), Interior) => Some(self.mesh.find_or_add_vertex(end.point)),
            (Interior, Edge(_)) => Some(self.mesh.find_or_add_vertex(end.point)),
            (Interior, Interior) => None,
            (Undefined, _) | (_, Undefined) => None,
        }
    }

    /// Merges `v` with a distinct corner of `face` lying within tolerance.
    fn snap_to_corner(&mut self, face: FaceId, v: VertexId) -> VertexId {
        let v = self.mesh.canonical_vertex(v);
        match locate(self.mesh, face, v) {
            Location::Corner(k) => {
                let Some(corners) = self.mesh.face(face).triangle() else {
                    return v;
                };
                let corner = corners[k];
                if corner == v {
                    v
                } else {
                    self.mesh.merge_vertices(corner.min(v), corner.max(v))
                }
            },
            _ => v,
        }
    }
}
