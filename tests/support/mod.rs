//! Test support library
//! Shared operands and checks for the integration tests.

#![allow(dead_code)]

use bsp_boolean::errors::BooleanResult;
use bsp_boolean::{BoolOpType, BooleanConfig, BooleanMesh, Solid, float_types::Real, perform_boolean_operation_with_config};
use nalgebra::{Point3, Vector3};

/// Tolerance for volume and area comparisons.
pub const VOLUME_EPS: Real = 1e-9;

/// The unit cube `[0, 1]^3`.
pub fn unit_cube() -> Solid {
    Solid::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
}

pub fn cube_at(min: [Real; 3], size: Real) -> Solid {
    let min = Point3::new(min[0], min[1], min[2]);
    Solid::cuboid(min, min + Vector3::repeat(size))
}

/// Axis-aligned box between two corners.
pub fn box_between(min: [Real; 3], max: [Real; 3]) -> Solid {
    Solid::cuboid(Point3::new(min[0], min[1], min[2]), Point3::new(max[0], max[1], max[2]))
}

/// Box overlapping the unit cube in a region with no coplanar faces.
pub fn offset_box() -> Solid {
    Solid::cuboid(Point3::new(0.5, 0.25, 0.375), Point3::new(1.5, 1.25, 1.375))
}

/// Right tetrahedron with its corner inside the unit cube.
pub fn corner_tetrahedron() -> Solid {
    let c = Point3::new(0.25, 0.25, 0.25);
    Solid::tetrahedron(
        c,
        c + Vector3::new(1.5, 0.0, 0.0),
        c + Vector3::new(0.0, 1.5, 0.0),
        c + Vector3::new(0.0, 0.0, 1.5),
    )
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Asserts that the result is a closed, consistently wound surface.
pub fn assert_closed(mesh: &BooleanMesh) {
    let analysis = mesh.analyze();
    assert!(mesh.is_closed(), "result has open edges: {analysis:?}");
    assert_eq!(analysis.boundary_edges, 0, "boundary edges in {analysis:?}");
    assert!(analysis.consistent_orientation, "inconsistent winding in {analysis:?}");
}

/// Asserts that every face normal agrees with its winding.
pub fn assert_normals_match_winding(mesh: &BooleanMesh) {
    for face in &mesh.faces {
        let v = face.vertices.as_slice();
        let (a, b, c) = (mesh.vertices[v[0]], mesh.vertices[v[1]], mesh.vertices[v[2]]);
        let winding = (b - a).cross(&(c - a));
        assert!(
            winding.dot(&face.plane.normal) > 0.0,
            "face {:?} is wound against its plane",
            face.vertices
        );
    }
}

/// Runs `op` with the closure self-check enabled.
pub fn run_strict(op: BoolOpType, a: &Solid, b: &Solid) -> BooleanResult<BooleanMesh> {
    perform_boolean_operation_with_config(
        op,
        a.faces.iter().copied(),
        a.vertices.iter().copied(),
        b.faces.iter().copied(),
        b.vertices.iter().copied(),
        &BooleanConfig::strict(),
    )
}

/// Asserts that no two faces cover the same corners.
pub fn assert_no_duplicate_faces(mesh: &BooleanMesh) {
    let mut seen = std::collections::HashSet::new();
    for face in &mesh.faces {
        let mut corners = face.vertices.as_slice().to_vec();
        corners.sort_unstable();
        assert!(seen.insert(corners.clone()), "duplicate face on corners {corners:?}");
    }
}

/// Asserts that both meshes have the same vertex positions, in any order.
pub fn assert_same_positions(a: &BooleanMesh, b: &BooleanMesh) {
    for (from, to) in [(a, b), (b, a)] {
        for p in &from.vertices {
            assert!(to.find_vertex(p).is_some(), "vertex {p} appears in only one result");
        }
    }
    assert_eq!(a.vertex_count(), b.vertex_count());
}
