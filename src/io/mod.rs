//! Export of results and operands to mesh file formats.

#[cfg(feature = "stl-io")]
pub mod stl;

use crate::float_types::Real;
use crate::output::BooleanMesh;
use crate::solid::Solid;
use nalgebra::{Point3, Vector3};

/// Anything that can present itself as a list of 3D triangles.
///
/// Writers are implemented once against this trait.
pub trait Triangulated3D {
    /// Calls `f` with the corners and unit normal of each triangle.
    fn visit_triangles<F>(&self, f: F)
    where
        F: FnMut([Point3<Real>; 3], Vector3<Real>);
}

impl Triangulated3D for BooleanMesh {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([Point3<Real>; 3], Vector3<Real>),
    {
        for face in &self.faces {
            let v = face.vertices.as_slice();
            for k in 1..v.len() - 1 {
                f(
                    [self.vertices[v[0]], self.vertices[v[k]], self.vertices[v[k + 1]]],
                    face.plane.normal,
                );
            }
        }
    }
}

impl Triangulated3D for Solid {
    fn visit_triangles<F>(&self, mut f: F)
    where
        F: FnMut([Point3<Real>; 3], Vector3<Real>),
    {
        for face in &self.faces {
            let v = face.vertices.as_slice();
            for k in 1..v.len() - 1 {
                let tri = [self.vertices[v[0]], self.vertices[v[k]], self.vertices[v[k + 1]]];
                let normal = (tri[1] - tri[0])
                    .cross(&(tri[2] - tri[0]))
                    .try_normalize(Real::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
                f(tri, normal);
            }
        }
    }
}
