use super::Triangulated3D;
use crate::output::BooleanMesh;
use crate::solid::Solid;
use std::fmt::Write as _;
use std::io::Cursor;

/// Writes `shape` as an **ASCII STL** solid called `name`.
///
/// ```rust
/// # use bsp_boolean::solid::Solid;
/// # use nalgebra::Point3;
/// let cube = Solid::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let text = cube.to_stl_ascii("cube");
/// assert!(text.starts_with("solid cube"));
/// assert_eq!(text.matches("facet normal").count(), 12);
/// ```
pub fn to_stl_ascii<T: Triangulated3D>(shape: &T, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "solid {name}");

    shape.visit_triangles(|tri, n| {
        let _ = writeln!(out, "  facet normal {:.6} {:.6} {:.6}", n.x, n.y, n.z);
        out.push_str("    outer loop\n");
        for p in &tri {
            let _ = writeln!(out, "      vertex {:.6} {:.6} {:.6}", p.x, p.y, p.z);
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    });

    let _ = writeln!(out, "endsolid {name}");
    out
}

/// Writes `shape` as a **binary STL** byte vector.
///
/// The binary header carries no name.
pub fn to_stl_binary<T: Triangulated3D>(shape: &T) -> std::io::Result<Vec<u8>> {
    use stl_io::{Normal, Triangle, Vertex, write_stl};

    let mut triangles = Vec::<Triangle>::new();
    shape.visit_triangles(|tri, n| {
        triangles.push(Triangle {
            normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
            vertices: tri.map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
        });
    });

    let mut cursor = Cursor::new(Vec::new());
    write_stl(&mut cursor, triangles.iter())?;
    Ok(cursor.into_inner())
}

impl BooleanMesh {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self)
    }
}

impl Solid {
    pub fn to_stl_ascii(&self, name: &str) -> String {
        self::to_stl_ascii(self, name)
    }

    pub fn to_stl_binary(&self) -> std::io::Result<Vec<u8>> {
        self::to_stl_binary(self)
    }
}
