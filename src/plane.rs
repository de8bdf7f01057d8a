//! Oriented planes.

use crate::float_types::{Real, tolerance};
use crate::math;
use crate::tag::{PointClass, TriClass};
use nalgebra::{Point3, Vector3};

/// Oriented plane `n · p = w` with unit normal.
///
/// The normal points out of the solid: points with positive signed distance
/// are classified [`PointClass::Out`], negative ones [`PointClass::In`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along normal
    pub w: Real,
}

impl Plane {
    /// Plane with the given normal (normalized here) and offset.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        Plane {
            normal: normal.normalize(),
            w,
        }
    }

    /// Plane through `point` with the given normal, or `None` for a zero normal.
    pub fn from_normal_and_point(normal: Vector3<Real>, point: &Point3<Real>) -> Option<Self> {
        let normal = normal.try_normalize(tolerance() * tolerance())?;
        Some(Plane {
            normal,
            w: normal.dot(&point.coords),
        })
    }

    /// Plane through three points, normal by the right-hand rule
    /// `(p2 - p1) × (p3 - p1)`.
    ///
    /// Returns `None` for collinear or coincident points.
    pub fn from_points(p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>) -> Option<Self> {
        if math::collinear(p1, p2, p3) {
            return None;
        }
        Self::from_normal_and_point((p2 - p1).cross(&(p3 - p1)), p1)
    }

    #[inline]
    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.w
    }

    /// Classifies a point with the global tolerance.
    #[inline]
    pub fn classify_point(&self, p: &Point3<Real>) -> PointClass {
        let d = self.signed_distance(p);
        if d > tolerance() {
            PointClass::Out
        } else if d < -tolerance() {
            PointClass::In
        } else {
            PointClass::On
        }
    }

    #[inline]
    pub fn classify_triangle(&self, p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>) -> TriClass {
        TriClass([
            self.classify_point(p1),
            self.classify_point(p2),
            self.classify_point(p3),
        ])
    }

    #[inline]
    pub fn contains_point(&self, p: &Point3<Real>) -> bool {
        self.classify_point(p) == PointClass::On
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Normals point the same way.
    #[inline]
    pub fn same_orientation(&self, other: &Plane) -> bool {
        math::orientation(&self.normal, &other.normal) > 0.0
    }

    /// Point where the segment `p1 p2` crosses the plane.
    ///
    /// The parameter is clamped to the segment, so the result always lies on
    /// it even when both ends sit within tolerance of the plane.
    pub fn intersect_segment(&self, p1: &Point3<Real>, p2: &Point3<Real>) -> Point3<Real> {
        let d1 = self.signed_distance(p1);
        let d2 = self.signed_distance(p2);
        let denom = d1 - d2;
        if denom.abs() < Real::EPSILON {
            return nalgebra::center(p1, p2);
        }
        let t = (d1 / denom).clamp(0.0, 1.0);
        p1 + (p2 - p1) * t
    }
}
