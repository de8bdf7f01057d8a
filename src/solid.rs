//! Input side of a boolean operation.

use crate::boolean::{BoolOpType, perform_boolean_operation};
use crate::errors::BooleanResult;
use crate::float_types::Real;
use crate::math;
use crate::mesh::FaceVertices;
use crate::output::BooleanMesh;
use nalgebra::{Point3, Vector3};
use std::fmt;

/// Which input solid a face came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    A,
    B,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::A => f.write_str("A"),
            Operand::B => f.write_str("B"),
        }
    }
}

/// One face of an input solid, indexing that solid's vertex list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRecord {
    pub vertices: FaceVertices,
    /// Host-side identifier carried through to the output for material lookup
    pub original_face: usize,
}

impl FaceRecord {
    pub const fn triangle(vertices: [usize; 3], original_face: usize) -> Self {
        FaceRecord {
            vertices: FaceVertices::Triangle(vertices),
            original_face,
        }
    }

    pub const fn quad(vertices: [usize; 4], original_face: usize) -> Self {
        FaceRecord {
            vertices: FaceVertices::Quad(vertices),
            original_face,
        }
    }
}

/// Provenance of an output face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceSource {
    pub operand: Operand,
    pub original_face: usize,
}

/// Closed, consistently oriented triangle/quad mesh owned by the caller.
///
/// Face winding is counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solid {
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<FaceRecord>,
}

impl Solid {
    pub const fn new(vertices: Vec<Point3<Real>>, faces: Vec<FaceRecord>) -> Self {
        Solid { vertices, faces }
    }

    /// Axis-aligned box spanning `min` to `max`, six quads with ids `0..6`
    /// in the order bottom, top, front, back, left, right.
    pub fn cuboid(min: Point3<Real>, max: Point3<Real>) -> Self {
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);
        let vertices = vec![
            Point3::new(x0, y0, z0),
            Point3::new(x1, y0, z0),
            Point3::new(x1, y1, z0),
            Point3::new(x0, y1, z0),
            Point3::new(x0, y0, z1),
            Point3::new(x1, y0, z1),
            Point3::new(x1, y1, z1),
            Point3::new(x0, y1, z1),
        ];
        let faces = vec![
            FaceRecord::quad([0, 3, 2, 1], 0),
            FaceRecord::quad([4, 5, 6, 7], 1),
            FaceRecord::quad([0, 1, 5, 4], 2),
            FaceRecord::quad([3, 7, 6, 2], 3),
            FaceRecord::quad([0, 4, 7, 3], 4),
            FaceRecord::quad([1, 2, 6, 5], 5),
        ];
        Solid { vertices, faces }
    }

    /// Tetrahedron over four points, wound outward whatever their order.
    pub fn tetrahedron(a: Point3<Real>, b: Point3<Real>, c: Point3<Real>, d: Point3<Real>) -> Self {
        let (b, c) = if (b - a).cross(&(c - a)).dot(&(d - a)) > 0.0 {
            (c, b)
        } else {
            (b, c)
        };
        Solid {
            vertices: vec![a, b, c, d],
            faces: vec![
                FaceRecord::triangle([0, 1, 2], 0),
                FaceRecord::triangle([0, 3, 1], 1),
                FaceRecord::triangle([1, 3, 2], 2),
                FaceRecord::triangle([2, 3, 0], 3),
            ],
        }
    }

    #[must_use]
    pub fn translated(&self, offset: Vector3<Real>) -> Self {
        Solid {
            vertices: self.vertices.iter().map(|p| p + offset).collect(),
            faces: self.faces.clone(),
        }
    }

    /// Enclosed volume by the divergence theorem; quads are fanned.
    pub fn volume(&self) -> Real {
        self.faces
            .iter()
            .map(|face| {
                let v = face.vertices.as_slice();
                (1..v.len() - 1)
                    .map(|k| {
                        math::signed_volume6(
                            &self.vertices[v[0]],
                            &self.vertices[v[k]],
                            &self.vertices[v[k + 1]],
                        )
                    })
                    .sum::<Real>()
            })
            .sum::<Real>()
            / 6.0
    }

    pub fn boolean(&self, op: BoolOpType, other: &Solid) -> BooleanResult<BooleanMesh> {
        perform_boolean_operation(
            op,
            self.faces.iter().copied(),
            self.vertices.iter().copied(),
            other.faces.iter().copied(),
            other.vertices.iter().copied(),
        )
    }

    pub fn union(&self, other: &Solid) -> BooleanResult<BooleanMesh> {
        self.boolean(BoolOpType::Union, other)
    }

    pub fn intersection(&self, other: &Solid) -> BooleanResult<BooleanMesh> {
        self.boolean(BoolOpType::Intersection, other)
    }

    pub fn difference(&self, other: &Solid) -> BooleanResult<BooleanMesh> {
        self.boolean(BoolOpType::Difference, other)
    }
}
