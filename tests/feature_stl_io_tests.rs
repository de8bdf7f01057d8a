#![cfg(feature = "stl-io")]

mod support;

use bsp_boolean::io::stl;
use std::io::Cursor;
use support::*;

#[test]
fn result_to_stl_ascii() {
    let result = unit_cube().difference(&offset_box()).unwrap();
    let text = result.to_stl_ascii("notched");
    assert!(text.starts_with("solid notched\n"));
    assert!(text.contains("endsolid notched"));
    assert_eq!(text.matches("endfacet").count(), result.triangle_count());
}

#[test]
fn result_to_stl_binary_and_back() -> Result<(), Box<dyn std::error::Error>> {
    let result = unit_cube().intersection(&offset_box())?;
    let bytes = stl::to_stl_binary(&result)?;

    let read = stl_io::read_stl(&mut Cursor::new(bytes))?;
    assert_eq!(read.faces.len(), result.triangle_count());
    for face in &read.faces {
        let n = face.normal;
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((length - 1.0).abs() < 1e-4);
    }
    Ok(())
}
