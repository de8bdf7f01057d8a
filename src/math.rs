//! Geometric predicates.
//!
//! Every comparison is made against the global [`tolerance`] so that the
//! splitting, classification and merge stages agree on what "on", "equal"
//! and "collinear" mean.

use crate::float_types::{Real, tolerance, tolerance_squared};
use nalgebra::{Point3, Vector3};

#[inline]
pub fn points_coincide(a: &Point3<Real>, b: &Point3<Real>) -> bool {
    (a - b).norm_squared() < tolerance_squared()
}

/// Distance from `p` to the infinite line through `a` and `b`.
pub fn distance_to_line(p: &Point3<Real>, a: &Point3<Real>, b: &Point3<Real>) -> Real {
    let ab = b - a;
    let len = ab.norm();
    if len < tolerance() {
        return (p - a).norm();
    }
    ab.cross(&(p - a)).norm() / len
}

/// Smallest altitude of the triangle `abc`.
///
/// Zero when two corners coincide.
pub fn min_altitude(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Real {
    let longest = (b - a).norm().max((c - b).norm()).max((a - c).norm());
    if longest < tolerance() {
        return 0.0;
    }
    (b - a).cross(&(c - a)).norm() / longest
}

/// Three points on one line (within tolerance), including coincident points.
#[inline]
pub fn collinear(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> bool {
    min_altitude(a, b, c) < tolerance()
}

#[inline]
pub fn triangle_area(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Real {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// `p` lies strictly between `a` and `b` on the segment joining them.
pub fn segment_contains(p: &Point3<Real>, a: &Point3<Real>, b: &Point3<Real>) -> bool {
    let eps = tolerance();
    let ab = b - a;
    let len = ab.norm();
    if len < eps || distance_to_line(p, a, b) >= eps {
        return false;
    }
    let t = (p - a).dot(&ab) / len;
    t > eps && t < len - eps
}

/// Circumcenter of triangle `abc` in its own plane.
pub fn circumcenter(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<Point3<Real>> {
    let u = a - c;
    let v = b - c;
    let n = u.cross(&v);
    let denom = 2.0 * n.norm_squared();
    if denom < tolerance_squared() * tolerance_squared() {
        return None;
    }
    let offset = (v * u.norm_squared() - u * v.norm_squared()).cross(&n) / denom;
    Some(c + offset)
}

/// Whether `q` falls strictly inside the circumcircle of `abc`.
///
/// Degenerate triangles have no circle and report `false`.
pub fn is_inside_circle(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>, q: &Point3<Real>) -> bool {
    match circumcenter(a, b, c) {
        Some(center) => (q - center).norm() < (a - center).norm() - tolerance(),
        None => false,
    }
}

/// Dot product of two face normals: positive when they face the same way.
#[inline]
pub fn orientation(n1: &Vector3<Real>, n2: &Vector3<Real>) -> Real {
    n1.dot(n2)
}

/// Signed distance of `p` from the edge `a -> b`, measured inside the
/// polygon plane with normal `normal`. Positive on the left of the edge.
#[inline]
pub fn edge_side(p: &Point3<Real>, a: &Point3<Real>, b: &Point3<Real>, normal: &Vector3<Real>) -> Real {
    let ab = b - a;
    let len = ab.norm();
    if len < tolerance() {
        return 0.0;
    }
    normal.dot(&ab.cross(&(p - a))) / len
}

/// Inclusive point-in-triangle test for a point near the triangle's plane.
pub fn point_in_triangle(
    p: &Point3<Real>,
    a: &Point3<Real>,
    b: &Point3<Real>,
    c: &Point3<Real>,
    normal: &Vector3<Real>,
) -> bool {
    let eps = tolerance();
    edge_side(p, a, b, normal) > -eps
        && edge_side(p, b, c, normal) > -eps
        && edge_side(p, c, a, normal) > -eps
}

/// Strictly convex polygon: every corner turns left by more than the
/// tolerance, so no three consecutive corners are collinear.
pub fn is_convex_polygon(points: &[Point3<Real>], normal: &Vector3<Real>) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let prev = &points[(i + n - 1) % n];
        let next = &points[(i + 1) % n];
        edge_side(&points[i], next, prev, normal) > tolerance()
    })
}

/// Convex polygon of positive area that may have straight corners.
pub fn is_weakly_convex_polygon(points: &[Point3<Real>], normal: &Vector3<Real>) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let turn = |i: usize| edge_side(&points[i], &points[(i + 1) % n], &points[(i + n - 1) % n], normal);
    (0..n).all(|i| turn(i) > -tolerance()) && (0..n).any(|i| turn(i) > tolerance())
}

/// Six times the signed volume of the tetrahedron `(origin, a, b, c)`.
#[inline]
pub fn signed_volume6(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Real {
    a.coords.dot(&b.coords.cross(&c.coords))
}
