use super::{FaceId, VertexId, vertex::Vertex};
use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::plane::Plane;
use crate::tag::FaceTag;
use nalgebra::Point3;
use std::sync::OnceLock;

/// Corner list of a face: the engine only ever stores triangles and quads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceVertices {
    Triangle([VertexId; 3]),
    Quad([VertexId; 4]),
}

impl FaceVertices {
    /// Builds a triangle or quad; any other length yields `None`.
    pub fn from_slice(indices: &[VertexId]) -> Option<Self> {
        match *indices {
            [a, b, c] => Some(FaceVertices::Triangle([a, b, c])),
            [a, b, c, d] => Some(FaceVertices::Quad([a, b, c, d])),
            _ => None,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[VertexId] {
        match self {
            FaceVertices::Triangle(v) => &v[..],
            FaceVertices::Quad(v) => &v[..],
        }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [VertexId] {
        match self {
            FaceVertices::Triangle(v) => &mut v[..],
            FaceVertices::Quad(v) => &mut v[..],
        }
    }

    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        self.as_slice().contains(&v)
    }

    #[inline]
    pub fn position(&self, v: VertexId) -> Option<usize> {
        self.as_slice().iter().position(|&x| x == v)
    }

    /// Same corners, opposite winding.
    #[must_use]
    pub fn reversed(&self) -> Self {
        match *self {
            FaceVertices::Triangle([a, b, c]) => FaceVertices::Triangle([c, b, a]),
            FaceVertices::Quad([a, b, c, d]) => FaceVertices::Quad([d, c, b, a]),
        }
    }

    /// Directed boundary edges in winding order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        let indices = self.as_slice();
        indices
            .iter()
            .zip(indices.iter().cycle().skip(1))
            .map(|(&a, &b)| (a, b))
    }

    /// A corner appears twice.
    pub fn has_repeats(&self) -> bool {
        let indices = self.as_slice();
        (0..indices.len()).any(|i| indices[i + 1..].contains(&indices[i]))
    }

    pub(crate) fn replace(&mut self, old: VertexId, new: VertexId) {
        for v in self.as_mut_slice() {
            if *v == old {
                *v = new;
            }
        }
    }
}

/// Face of the indexed mesh.
///
/// The plane is fixed when the face is imported and inherited unchanged by
/// every fragment split off it, so fragments never re-derive a normal from
/// slivers.
#[derive(Debug, Clone)]
pub struct Face {
    vertices: FaceVertices,
    plane: Plane,
    /// Index of the imported face this one descends from
    original_face: FaceId,
    pub tag: FaceTag,
    /// Lazily-computed axis-aligned bounding box of the face
    bounding_box: OnceLock<Aabb>,
}

impl Face {
    pub fn new(vertices: FaceVertices, plane: Plane, original_face: FaceId) -> Self {
        Face {
            vertices,
            plane,
            original_face,
            tag: FaceTag::Unclassified,
            bounding_box: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: FaceTag) -> Self {
        self.tag = tag;
        self
    }

    #[inline]
    pub const fn vertices(&self) -> &FaceVertices {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[VertexId] {
        self.vertices.as_slice()
    }

    #[inline]
    pub const fn plane(&self) -> &Plane {
        &self.plane
    }

    #[inline]
    pub const fn original_face(&self) -> FaceId {
        self.original_face
    }

    #[inline]
    pub fn is_retired(&self) -> bool {
        self.tag.is_retired()
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        matches!(self.vertices, FaceVertices::Triangle(_))
    }

    /// Corners of a triangle, `None` for quads.
    #[inline]
    pub fn triangle(&self) -> Option<[VertexId; 3]> {
        match self.vertices {
            FaceVertices::Triangle(t) => Some(t),
            FaceVertices::Quad(_) => None,
        }
    }

    /// Directed boundary edges in winding order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.vertices.edges()
    }

    /// Corner positions in winding order.
    pub fn points(&self, vertices: &[Vertex]) -> Vec<Point3<Real>> {
        self.indices().iter().map(|&v| vertices[v].point).collect()
    }

    /// Axis aligned bounding box of this face (cached after first call)
    pub fn bounding_box(&self, vertices: &[Vertex]) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut bbox = Aabb::from_point(vertices[self.indices()[0]].point);
            for &v in &self.indices()[1..] {
                bbox.grow(&vertices[v].point);
            }
            bbox
        })
    }

    /// Reverses the winding and flips the plane.
    pub fn invert(&mut self) {
        self.vertices = self.vertices.reversed();
        self.plane.flip();
    }

    pub(crate) fn replace_vertex(&mut self, old: VertexId, new: VertexId) {
        self.vertices.replace(old, new);
        self.bounding_box = OnceLock::new();
    }
}
