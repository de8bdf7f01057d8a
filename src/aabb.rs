use crate::float_types::{Real, tolerance};
use nalgebra::Point3;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub mins: Point3<Real>,
    pub maxs: Point3<Real>,
}

impl Aabb {
    #[inline]
    pub const fn new(mins: Point3<Real>, maxs: Point3<Real>) -> Self {
        Self { mins, maxs }
    }

    /// Box around a single point.
    #[inline]
    pub const fn from_point(p: Point3<Real>) -> Self {
        Self { mins: p, maxs: p }
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<Real>>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bbox = Self::from_point(*points.next()?);
        for p in points {
            bbox.grow(p);
        }
        Some(bbox)
    }

    #[inline]
    pub fn grow(&mut self, p: &Point3<Real>) {
        self.mins = self.mins.inf(p);
        self.maxs = self.maxs.sup(p);
    }

    /// Overlap test, padded by the global tolerance so touching boxes count.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        let eps = tolerance();
        self.maxs.x + eps >= other.mins.x
            && self.mins.x - eps <= other.maxs.x
            && self.maxs.y + eps >= other.mins.y
            && self.mins.y - eps <= other.maxs.y
            && self.maxs.z + eps >= other.mins.z
            && self.mins.z - eps <= other.maxs.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let b = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn from_points_covers_all() {
        let points = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 3.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let bbox = Aabb::from_points(&points).unwrap();
        assert_eq!(bbox.mins, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.maxs, Point3::new(1.0, 3.0, 4.0));
        assert!(Aabb::from_points(&[]).is_none());
    }
}
