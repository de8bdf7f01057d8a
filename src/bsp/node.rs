//! BSP tree node data structure

use crate::plane::Plane;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// A BSP node: a splitting plane plus optional inside/outside subtrees.
///
/// A missing child is a leaf: everything reaching it is classified by the
/// side it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BspNode {
    pub plane: Plane,

    /// Subtree for the half-space behind the plane (inside the solid).
    pub in_child: Option<NodeId>,

    /// Subtree for the half-space in front of the plane.
    pub out_child: Option<NodeId>,

    /// Distance from the root, root is `1`.
    pub depth: usize,
}

impl BspNode {
    pub const fn new(plane: Plane, depth: usize) -> Self {
        Self {
            plane,
            in_child: None,
            out_child: None,
            depth,
        }
    }
}
