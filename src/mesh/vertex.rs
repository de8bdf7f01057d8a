use super::{EdgeId, VertexId};
use crate::float_types::Real;
use crate::tag::VertexTag;
use nalgebra::Point3;

/// Mesh vertex: a position and the edges that end at it.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub point: Point3<Real>,
    pub tag: VertexTag,
    edges: Vec<EdgeId>,
    /// Survivor of a merge that retired this vertex
    merged_into: Option<VertexId>,
}

impl Vertex {
    pub const fn new(point: Point3<Real>) -> Self {
        Vertex {
            point,
            tag: VertexTag::Unclassified,
            edges: Vec::new(),
            merged_into: None,
        }
    }

    #[inline]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.tag == VertexTag::Broken
    }

    #[inline]
    pub fn merged_into(&self) -> Option<VertexId> {
        self.merged_into
    }

    pub(crate) fn set_merged_into(&mut self, survivor: VertexId) {
        self.merged_into = Some(survivor);
    }

    pub(crate) fn add_edge(&mut self, edge: EdgeId) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeId) {
        self.edges.retain(|&e| e != edge);
    }

    pub(crate) fn take_edges(&mut self) -> Vec<EdgeId> {
        std::mem::take(&mut self.edges)
    }
}
