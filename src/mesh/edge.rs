use super::{FaceId, VertexId};

/// Undirected edge with the live faces that border it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    vertices: [VertexId; 2],
    faces: Vec<FaceId>,
}

impl Edge {
    pub const fn new(v1: VertexId, v2: VertexId) -> Self {
        Edge {
            vertices: [v1, v2],
            faces: Vec::new(),
        }
    }

    #[inline]
    pub const fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[FaceId] {
        &self.faces
    }

    #[inline]
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    /// The other end of the edge, if `v` is one of its ends.
    #[inline]
    pub fn opposite(&self, v: VertexId) -> Option<VertexId> {
        match self.vertices {
            [a, b] if a == v => Some(b),
            [a, b] if b == v => Some(a),
            _ => None,
        }
    }

    pub(crate) fn add_face(&mut self, face: FaceId) {
        if !self.faces.contains(&face) {
            self.faces.push(face);
        }
    }

    pub(crate) fn remove_face(&mut self, face: FaceId) {
        self.faces.retain(|&f| f != face);
    }

    pub(crate) fn take_faces(&mut self) -> Vec<FaceId> {
        std::mem::take(&mut self.faces)
    }

    pub(crate) fn replace_vertex(&mut self, old: VertexId, new: VertexId) {
        for v in &mut self.vertices {
            if *v == old {
                *v = new;
            }
        }
    }
}
