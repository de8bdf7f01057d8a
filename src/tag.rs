//! Classification tags.
//!
//! Points are classified against a single plane ([`PointClass`]), triangles as
//! a triple of point classes ([`TriClass`]), and whole faces against a BSP
//! tree ([`Classification`]). Mesh elements carry a lifecycle tag
//! ([`FaceTag`], [`VertexTag`]).

use std::fmt;

/// Position of a point relative to an oriented plane.
///
/// `In` is the half-space opposite the plane normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointClass {
    In,
    Out,
    On,
}

/// Classes of the three corners of a triangle against one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriClass(pub [PointClass; 3]);

impl TriClass {
    #[inline]
    pub fn count(&self, class: PointClass) -> usize {
        self.0.iter().filter(|&&c| c == class).count()
    }

    /// Corner index of the first point with the given class.
    #[inline]
    pub fn position(&self, class: PointClass) -> Option<usize> {
        self.0.iter().position(|&c| c == class)
    }

    #[inline]
    pub fn get(&self, corner: usize) -> PointClass {
        self.0[corner]
    }
}

/// Result of classifying a face against a solid.
///
/// The compound variants record that part of the face lies on a splitting
/// plane (`InOn`, `OutOn`) or that pieces landed on both sides (`InOut`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    In,
    Out,
    On,
    InOn,
    OutOn,
    InOut,
    Unclassified,
}

impl Classification {
    /// Records contact with a splitting plane.
    #[inline]
    pub const fn add_on(self) -> Self {
        match self {
            Classification::In => Classification::InOn,
            Classification::Out => Classification::OutOn,
            other => other,
        }
    }

    /// Whether two partial results describe the same side of the solid.
    ///
    /// `In` agrees with `In` and `InOn`, `Out` with `Out` and `OutOn`; the
    /// on-variants agree with themselves and their plain side.
    #[inline]
    pub const fn agrees_with(self, other: Self) -> bool {
        use Classification::*;
        matches!(
            (self, other),
            (In | InOn, In | InOn) | (Out | OutOn, Out | OutOn) | (On, On)
        )
    }

    /// Inside, possibly touching the boundary.
    #[inline]
    pub const fn is_inside(self) -> bool {
        matches!(self, Classification::In | Classification::InOn)
    }

    /// Outside, possibly touching the boundary.
    #[inline]
    pub const fn is_outside(self) -> bool {
        matches!(self, Classification::Out | Classification::OutOn)
    }
}

/// Lifecycle tag of a face in the indexed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceTag {
    #[default]
    Unclassified,
    In,
    Out,
    /// Touches the other solid's boundary; still needs splitting.
    On,
    /// Straddles the other solid's boundary; still needs splitting.
    InOut,
    /// Replaced by its fragments, or rejected by selection.
    Broken,
    /// Degenerate (near-zero area) fragment.
    Phantom,
    /// Duplicate of a coplanar face kept from the other operand.
    Overlapped,
}

impl FaceTag {
    /// Retired faces are excluded from adjacency and from output.
    #[inline]
    pub const fn is_retired(self) -> bool {
        matches!(self, FaceTag::Broken | FaceTag::Phantom | FaceTag::Overlapped)
    }

    /// Faces that still take part in pairwise intersection.
    #[inline]
    pub const fn is_candidate(self) -> bool {
        matches!(self, FaceTag::Unclassified | FaceTag::On | FaceTag::InOut)
    }
}

impl From<Classification> for FaceTag {
    fn from(class: Classification) -> Self {
        match class {
            Classification::In => FaceTag::In,
            Classification::Out => FaceTag::Out,
            Classification::On | Classification::InOn | Classification::OutOn => FaceTag::On,
            Classification::InOut => FaceTag::InOut,
            Classification::Unclassified => FaceTag::Unclassified,
        }
    }
}

/// Lifecycle tag of a vertex in the indexed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexTag {
    #[default]
    Unclassified,
    /// Merged into another vertex or removed by simplification.
    Broken,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::In => "IN",
            Classification::Out => "OUT",
            Classification::On => "ON",
            Classification::InOn => "IN_ON",
            Classification::OutOn => "OUT_ON",
            Classification::InOut => "IN_OUT",
            Classification::Unclassified => "UNCLASSIFIED",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_on_only_touches_plain_sides() {
        assert_eq!(Classification::In.add_on(), Classification::InOn);
        assert_eq!(Classification::Out.add_on(), Classification::OutOn);
        assert_eq!(Classification::InOut.add_on(), Classification::InOut);
        assert_eq!(Classification::InOn.add_on(), Classification::InOn);
    }

    #[test]
    fn agreement_is_per_side() {
        use Classification::*;
        assert!(In.agrees_with(InOn));
        assert!(OutOn.agrees_with(Out));
        assert!(!In.agrees_with(Out));
        assert!(!InOn.agrees_with(OutOn));
        assert!(!InOut.agrees_with(InOut));
    }

    #[test]
    fn tri_class_counts() {
        let tri = TriClass([PointClass::In, PointClass::On, PointClass::In]);
        assert_eq!(tri.count(PointClass::In), 2);
        assert_eq!(tri.position(PointClass::On), Some(1));
        assert_eq!(tri.position(PointClass::Out), None);
    }

    #[test]
    fn face_tag_lifecycle() {
        assert!(FaceTag::Broken.is_retired());
        assert!(FaceTag::Overlapped.is_retired());
        assert!(!FaceTag::In.is_retired());
        assert!(FaceTag::from(Classification::OutOn).is_candidate());
        assert!(!FaceTag::from(Classification::Out).is_candidate());
    }
}
