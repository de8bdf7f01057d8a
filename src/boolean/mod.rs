//! Boolean operations between two closed triangle meshes.
//!
//! Both operands are imported into one [`IndexedMesh`] and each is turned
//! into a BSP tree. The operation is expressed as an intersection of
//! possibly inverted solids:
//!
//! | operation    | A        | B        | result   |
//! |--------------|----------|----------|----------|
//! | intersection | as is    | as is    | as is    |
//! | difference   | as is    | inverted | as is    |
//! | union        | inverted | inverted | inverted |
//!
//! so selection is always "keep what lies inside the other operand".
//! Faces that cannot be classified whole are cut along the other operand's
//! surface until every fragment is inside or outside.

pub(crate) mod face2face;
pub mod merge;
pub mod segment;
pub(crate) mod triangulator;

use crate::bsp::BspTree;
use crate::config::BooleanConfig;
use crate::errors::{BooleanOpError, BooleanResult};
use crate::float_types::Real;
use crate::math;
use crate::mesh::{FaceId, IndexedMesh, VertexId};
use crate::output::BooleanMesh;
use crate::solid::{FaceRecord, Operand};
use crate::tag::{Classification, FaceTag};
use face2face::FaceIntersector;
use merge::Merger;
use nalgebra::Point3;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use tracing::{debug, info_span, warn};
use triangulator::Triangulator;

/// Upper bound on sewing sweeps over the open edges.
const MAX_SEW_PASSES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOpType {
    Intersection,
    Union,
    Difference,
}

impl BoolOpType {
    pub const ALL: [BoolOpType; 3] = [BoolOpType::Intersection, BoolOpType::Union, BoolOpType::Difference];

    /// Which of A, B and the result are inverted to express the operation
    /// as an intersection.
    pub const fn inversions(self) -> (bool, bool, bool) {
        match self {
            BoolOpType::Intersection => (false, false, false),
            BoolOpType::Difference => (false, true, false),
            BoolOpType::Union => (true, true, true),
        }
    }
}

impl fmt::Display for BoolOpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoolOpType::Intersection => "intersection",
            BoolOpType::Union => "union",
            BoolOpType::Difference => "difference",
        })
    }
}

impl TryFrom<u32> for BoolOpType {
    type Error = BooleanOpError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoolOpType::Intersection),
            1 => Ok(BoolOpType::Union),
            2 => Ok(BoolOpType::Difference),
            other => Err(BooleanOpError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl FromStr for BoolOpType {
    type Err = BooleanOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intersection" | "intersect" => Ok(BoolOpType::Intersection),
            "union" => Ok(BoolOpType::Union),
            "difference" | "subtract" => Ok(BoolOpType::Difference),
            _ => Err(BooleanOpError::UnsupportedOperation(s.to_owned())),
        }
    }
}

/// Runs `op` on two solids with the default [`BooleanConfig`].
///
/// Each operand is a list of triangle or quad records indexing its own
/// vertex list. Both must be closed, consistently outward-oriented meshes;
/// anything else produces a best-effort result.
///
/// ```
/// use bsp_boolean::boolean::{BoolOpType, perform_boolean_operation};
/// use bsp_boolean::solid::Solid;
/// use nalgebra::{Point3, Vector3};
///
/// let a = Solid::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let b = a.translated(Vector3::new(0.5, 0.0, 0.0));
/// let out = perform_boolean_operation(BoolOpType::Difference, a.faces, a.vertices, b.faces, b.vertices)?;
/// assert!((out.volume() - 0.5).abs() < 1e-9);
/// # Ok::<(), bsp_boolean::errors::BooleanOpError>(())
/// ```
pub fn perform_boolean_operation<FA, VA, FB, VB>(
    op: BoolOpType,
    faces_a: FA,
    vertices_a: VA,
    faces_b: FB,
    vertices_b: VB,
) -> BooleanResult<BooleanMesh>
where
    FA: IntoIterator<Item = FaceRecord>,
    VA: IntoIterator<Item = Point3<Real>>,
    FB: IntoIterator<Item = FaceRecord>,
    VB: IntoIterator<Item = Point3<Real>>,
{
    perform_boolean_operation_with_config(
        op,
        faces_a,
        vertices_a,
        faces_b,
        vertices_b,
        &BooleanConfig::default(),
    )
}

pub fn perform_boolean_operation_with_config<FA, VA, FB, VB>(
    op: BoolOpType,
    faces_a: FA,
    vertices_a: VA,
    faces_b: FB,
    vertices_b: VB,
    config: &BooleanConfig,
) -> BooleanResult<BooleanMesh>
where
    FA: IntoIterator<Item = FaceRecord>,
    VA: IntoIterator<Item = Point3<Real>>,
    FB: IntoIterator<Item = FaceRecord>,
    VB: IntoIterator<Item = Point3<Real>>,
{
    let span = info_span!("boolean", %op);
    let _guard = span.enter();

    let mut mesh = IndexedMesh::new();
    let range_a = mesh.import_solid(Operand::A, faces_a, vertices_a)?;
    let range_b = mesh.import_solid(Operand::B, faces_b, vertices_b)?;
    let first_new_vertex = mesh.num_vertices();
    let input_faces = mesh.num_faces();

    let (invert_a, invert_b, invert_result) = op.inversions();
    if invert_a {
        range_a.faces.clone().for_each(|f| mesh.invert_face(f));
    }
    if invert_b {
        range_b.faces.clone().for_each(|f| mesh.invert_face(f));
    }

    let tree_a = BspTree::from_mesh_faces(&mesh, range_a.faces.clone(), invert_a);
    let tree_b = BspTree::from_mesh_faces(&mesh, range_b.faces.clone(), invert_b);
    debug!(
        nodes_a = tree_a.num_nodes(),
        depth_a = tree_a.depth(),
        nodes_b = tree_b.num_nodes(),
        depth_b = tree_b.depth(),
        "built trees"
    );

    let mut candidates_a = prefilter(&mut mesh, range_a.faces.clone(), &tree_b);
    let mut candidates_b = prefilter(&mut mesh, range_b.faces.clone(), &tree_a);
    debug!(
        candidates_a = candidates_a.len(),
        candidates_b = candidates_b.len(),
        "prefiltered faces"
    );

    let budget = config.effective_face_budget(input_faces);
    let completed = FaceIntersector::new(&mut mesh, budget).run(&mut candidates_a, &mut candidates_b);
    if !completed {
        warn!(budget, "intersection stopped early, result may not be closed");
    }
    debug!(faces = mesh.num_faces(), vertices = mesh.num_vertices(), "intersected faces");

    classify_candidates(&mut mesh, &tree_a, &tree_b);
    let dropped = select_inside(&mut mesh);
    let overlapped = remove_overlapped(&mut mesh);
    debug!(dropped, overlapped, "selected faces");

    if config.sew_boundaries {
        let splits = sew_boundaries(&mut mesh);
        debug!(splits, "sewed boundaries");
    }
    if config.merge_faces {
        let stats = Merger::new(&mut mesh, first_new_vertex).run();
        debug!(
            vertices_removed = stats.vertices_removed,
            quads_formed = stats.quads_formed,
            "merged faces"
        );
    }

    if invert_result {
        let live: Vec<FaceId> = mesh.live_faces().collect();
        live.into_iter().for_each(|f| mesh.invert_face(f));
    }
    if config.self_check {
        mesh.check_closure()?;
    }

    let result = BooleanMesh::from_indexed(&mesh)?;
    debug!(
        faces = result.face_count(),
        vertices = result.vertex_count(),
        "boolean finished"
    );
    Ok(result)
}

/// Tags the faces of one operand that can be decided without cutting and
/// returns the rest.
///
/// Small operands against deep trees go through the full classification;
/// otherwise faces away from the other operand's bounding box take the
/// cheap single-path classification and all others become candidates.
fn prefilter(mesh: &mut IndexedMesh, faces: Range<FaceId>, other: &BspTree) -> Vec<FaceId> {
    let faces: Vec<FaceId> = faces.filter(|&f| !mesh.face(f).is_retired()).collect();
    let full = 0.25 * faces.len() as Real > other.depth() as Real;

    let mut candidates = Vec::new();
    for f in faces {
        let Some([p1, p2, p3]) = mesh.triangle_points(f) else {
            continue;
        };
        let plane = *mesh.face(f).plane();
        let tag = if full {
            FaceTag::from(other.classify_face(&p1, &p2, &p3, &plane))
        } else if other
            .bounding_box()
            .is_none_or(|bbox| !bbox.intersects(&mesh.face_bbox(f)))
        {
            decided(other.simplified_classify_face(&p1, &p2, &p3, &plane))
        } else {
            FaceTag::Unclassified
        };
        mesh.set_face_tag(f, tag);
        if tag.is_candidate() {
            candidates.push(f);
        }
    }
    candidates
}

fn decided(class: Classification) -> FaceTag {
    if class.is_inside() { FaceTag::In } else { FaceTag::Out }
}

/// Settles every face still carrying a candidate tag against the other
/// operand's tree.
fn classify_candidates(mesh: &mut IndexedMesh, tree_a: &BspTree, tree_b: &BspTree) {
    for f in 0..mesh.num_faces() {
        let face = mesh.face(f);
        if face.is_retired() || !face.tag.is_candidate() {
            continue;
        }
        let Some([p1, p2, p3]) = mesh.triangle_points(f) else {
            continue;
        };
        let plane = *face.plane();
        let tree = match mesh.operand_of(f) {
            Operand::A => tree_b,
            Operand::B => tree_a,
        };
        let class = tree.classify_face(&p1, &p2, &p3, &plane);
        let tag = if class.is_inside() || class.is_outside() {
            decided(class)
        } else {
            decided(tree.simplified_classify_face(&p1, &p2, &p3, &plane))
        };
        mesh.set_face_tag(f, tag);
    }
}

/// Retires every live face not tagged [`FaceTag::In`]. Returns how many.
fn select_inside(mesh: &mut IndexedMesh) -> usize {
    let dropped: Vec<FaceId> = mesh
        .live_faces()
        .filter(|&f| mesh.face(f).tag != FaceTag::In)
        .collect();
    for &f in &dropped {
        mesh.set_face_tag(f, FaceTag::Broken);
    }
    dropped.len()
}

/// Retires B faces that duplicate a kept, same-facing A face.
///
/// Coplanar regions shared by both operands are tiled identically by the
/// intersection stage, so both copies survive selection; only A's is kept.
fn remove_overlapped(mesh: &mut IndexedMesh) -> usize {
    let (kept_a, kept_b): (Vec<FaceId>, Vec<FaceId>) = mesh
        .live_faces()
        .partition(|&f| mesh.operand_of(f) == Operand::A);

    let mut removed = 0;
    for g in kept_b {
        let Some([q1, q2, q3]) = mesh.triangle_points(g) else {
            continue;
        };
        let centroid = Point3::from((q1.coords + q2.coords + q3.coords) / 3.0);
        let plane_g = *mesh.face(g).plane();
        let bbox_g = mesh.face_bbox(g);

        let duplicate = kept_a.iter().any(|&f| {
            let plane_f = mesh.face(f).plane();
            if !plane_f.same_orientation(&plane_g) || !mesh.face_bbox(f).intersects(&bbox_g) {
                return false;
            }
            if ![q1, q2, q3].iter().all(|q| plane_f.contains_point(q)) {
                return false;
            }
            mesh.triangle_points(f)
                .is_some_and(|[a, b, c]| math::point_in_triangle(&centroid, &a, &b, &c, &plane_f.normal))
        });
        if duplicate {
            mesh.set_face_tag(g, FaceTag::Overlapped);
            removed += 1;
        }
    }
    removed
}

/// Closes T-junctions left along the seams of the result.
///
/// An edge bordered by a single face is split at every boundary vertex lying
/// strictly inside it, nearest first, until no open edge has one.
fn sew_boundaries(mesh: &mut IndexedMesh) -> usize {
    let mut splits = 0;
    for _ in 0..MAX_SEW_PASSES {
        let open: Vec<[VertexId; 2]> = mesh
            .edges()
            .iter()
            .filter(|e| e.faces().len() == 1)
            .map(|e| e.vertices())
            .collect();
        if open.is_empty() {
            break;
        }
        let mut boundary: Vec<VertexId> = open.iter().flatten().copied().collect();
        boundary.sort_unstable();
        boundary.dedup();

        let mut changed = false;
        for [a, b] in open {
            if mesh.faces_of_edge(a, b).len() != 1 {
                continue;
            }
            let (pa, pb) = (mesh.point(a), mesh.point(b));
            let nearest = boundary
                .iter()
                .copied()
                .filter(|&v| v != a && v != b && !mesh.vertex(v).is_broken())
                .filter(|&v| math::segment_contains(&mesh.point(v), &pa, &pb))
                .min_by(|&u, &v| {
                    let du = (mesh.point(u) - pa).norm_squared();
                    let dv = (mesh.point(v) - pa).norm_squared();
                    du.total_cmp(&dv)
                });
            let Some(v) = nearest else {
                continue;
            };
            if Triangulator::new(mesh).split_edge(a, b, v) {
                splits += 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    splits
}
