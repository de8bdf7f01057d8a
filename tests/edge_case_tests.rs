//! Operand layouts that avoid the cutting stage entirely or exercise its
//! degenerate paths.

mod support;

use bsp_boolean::{
    BoolOpType, BooleanOpError, FaceRecord, Operand, ResultCode, Solid, perform_boolean_operation,
};
use bsp_boolean::float_types::Real;
use nalgebra::Point3;
use support::*;

#[test]
fn disjoint_union_keeps_both_cubes_as_quads() {
    let a = unit_cube();
    let b = cube_at([3.0, 0.0, 0.0], 1.0);
    let union = a.union(&b).unwrap();
    assert!(approx_eq(union.volume(), 2.0, VOLUME_EPS));
    assert_eq!(union.face_count(), 12);
    assert_eq!(union.quad_count(), 12);
    assert_eq!(union.vertex_count(), 16);
    assert_eq!(union.analyze().connected_components, 2);
    assert_closed(&union);
}

#[test]
fn disjoint_intersection_is_empty() {
    let a = unit_cube();
    let b = cube_at([3.0, 0.0, 0.0], 1.0);
    let intersection = a.intersection(&b).unwrap();
    assert!(intersection.is_empty());
    assert_eq!(intersection.vertex_count(), 0);
    assert!(approx_eq(intersection.volume(), 0.0, VOLUME_EPS));
}

#[test]
fn disjoint_difference_returns_first_operand() {
    let a = unit_cube();
    let b = cube_at([3.0, 0.0, 0.0], 1.0);
    let difference = a.difference(&b).unwrap();
    assert_eq!(difference.face_count(), 6);
    assert!(difference.faces_from(Operand::B).next().is_none());
    assert!(approx_eq(difference.volume(), 1.0, VOLUME_EPS));
}

#[test]
fn contained_operand() {
    let outer = cube_at([0.0, 0.0, 0.0], 3.0);
    let inner = cube_at([1.0, 1.0, 1.0], 1.0);

    let intersection = outer.intersection(&inner).unwrap();
    assert!(approx_eq(intersection.volume(), 1.0, VOLUME_EPS));
    assert!(intersection.faces_from(Operand::A).next().is_none());

    let union = outer.union(&inner).unwrap();
    assert!(approx_eq(union.volume(), 27.0, VOLUME_EPS));
    assert!(union.faces_from(Operand::B).next().is_none());

    // A cavity: both shells survive, the inner one facing inward.
    let hollow = outer.difference(&inner).unwrap();
    assert!(approx_eq(hollow.volume(), 26.0, VOLUME_EPS));
    assert_eq!(hollow.analyze().connected_components, 2);
    assert_closed(&hollow);
}

/// Length of the overlap of two intervals, zero when they only touch.
fn overlap(a: [Real; 2], b: [Real; 2]) -> Real {
    (a[1].min(b[1]) - a[0].max(b[0])).max(0.0)
}

#[test]
fn box_touching_a_face_stays_closed() {
    let a = unit_cube();
    let b = box_between([1.0, -0.5, 0.5], [3.0, 1.5, 2.5]);

    let difference = run_strict(BoolOpType::Difference, &a, &b).unwrap();
    assert!(approx_eq(difference.volume(), 1.0, VOLUME_EPS), "{}", difference.volume());
    assert_closed(&difference);

    let union = run_strict(BoolOpType::Union, &a, &b).unwrap();
    assert!(approx_eq(union.volume(), 9.0, VOLUME_EPS), "{}", union.volume());
    assert_closed(&union);

    let intersection = run_strict(BoolOpType::Intersection, &a, &b).unwrap();
    assert!(approx_eq(intersection.volume(), 0.0, VOLUME_EPS));
}

#[test]
fn slab_sharing_two_faces_stays_closed() {
    let a = unit_cube();
    let b = box_between([-0.75, 0.5, 0.0], [1.25, 1.0, 1.0]);
    let intersection = run_strict(BoolOpType::Intersection, &a, &b).unwrap();
    assert!(approx_eq(intersection.volume(), 0.5, VOLUME_EPS), "{}", intersection.volume());
    assert!(approx_eq(intersection.surface_area(), 4.0, VOLUME_EPS));
    assert_closed(&intersection);
}

#[test]
fn touching_and_coplanar_boxes_stay_closed() {
    let cube = [0.0, 1.0];
    let xs = [[1.0, 2.0], [0.5, 1.5], [0.0, 1.0], [-0.5, 0.5], [0.25, 0.75]];
    let ys = [[0.0, 1.0], [0.5, 1.5], [-0.5, 0.5], [0.25, 0.75]];
    let zs = [[0.0, 1.0], [0.5, 1.5], [0.25, 1.25]];

    let a = unit_cube();
    for x in xs {
        for y in ys {
            for z in zs {
                if [x, y, z] == [cube; 3] {
                    continue;
                }
                let b = box_between([x[0], y[0], z[0]], [x[1], y[1], z[1]]);
                let shared = overlap(cube, x) * overlap(cube, y) * overlap(cube, z);
                let volume_b = (x[1] - x[0]) * (y[1] - y[0]) * (z[1] - z[0]);

                for (op, expected) in [
                    (BoolOpType::Intersection, shared),
                    (BoolOpType::Union, 1.0 + volume_b - shared),
                    (BoolOpType::Difference, 1.0 - shared),
                ] {
                    let result = run_strict(op, &a, &b)
                        .unwrap_or_else(|e| panic!("{op} with {x:?} {y:?} {z:?}: {e}"));
                    assert!(
                        approx_eq(result.volume(), expected, VOLUME_EPS),
                        "{op} with {x:?} {y:?} {z:?}: volume {} != {expected}",
                        result.volume()
                    );
                    assert_closed(&result);
                }
            }
        }
    }
}

#[test]
fn degenerate_faces_in_operand_are_ignored() {
    let a = unit_cube();
    let mut b = cube_at([3.0, 0.0, 0.0], 1.0);
    // A zero-area sliver on a repeated vertex
    b.faces.push(FaceRecord::triangle([0, 0, 1], 6));

    let union = a.union(&b).unwrap();
    assert!(approx_eq(union.volume(), 2.0, VOLUME_EPS));
    assert!(union.faces.iter().all(|f| f.source.original_face != 6));
}

#[test]
fn flat_operand_contributes_nothing_to_union() {
    let a = unit_cube();
    let flat = Solid::new(
        vec![
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(7.0, 0.0, 0.0),
        ],
        vec![FaceRecord::triangle([0, 1, 2], 0)],
    );
    let union = a.union(&flat).unwrap();
    assert_eq!(union.faces_from(Operand::B).count(), 0);
    assert!(approx_eq(union.volume(), 1.0, VOLUME_EPS));
}

#[test]
fn empty_operand_is_rejected() {
    let a = unit_cube();
    let err = perform_boolean_operation(
        BoolOpType::Union,
        a.faces.clone(),
        a.vertices.clone(),
        Vec::<FaceRecord>::new(),
        Vec::<Point3<Real>>::new(),
    )
    .unwrap_err();
    assert_eq!(err, BooleanOpError::EmptyMesh { operand: Operand::B });
    assert_eq!(err.code(), ResultCode::Error);
}

#[test]
fn out_of_range_index_is_rejected() {
    let a = unit_cube();
    let mut b = unit_cube();
    b.faces[2] = FaceRecord::quad([0, 1, 5, 8], 2);
    let err = a.difference(&b).unwrap_err();
    assert_eq!(
        err,
        BooleanOpError::InvalidFace {
            operand: Operand::B,
            face: 2,
            vertex: 8,
            vertex_count: 8,
        }
    );
}

#[test]
fn operation_selectors() {
    assert_eq!(BoolOpType::try_from(1).unwrap(), BoolOpType::Union);
    assert_eq!("difference".parse::<BoolOpType>().unwrap(), BoolOpType::Difference);
    let err = BoolOpType::try_from(7).unwrap_err();
    assert!(matches!(err, BooleanOpError::UnsupportedOperation(ref s) if s == "7"));
    assert_eq!(err.code(), ResultCode::Error);
}
