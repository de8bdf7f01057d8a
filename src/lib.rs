//! Exact-topology **boolean operations** (*union*, *intersection*,
//! *difference*) on closed triangle meshes, classified with [BSP](bsp) trees.
//!
//! Both operands are welded into one indexed mesh. Faces that straddle the
//! other operand's surface are cut along it, every fragment is classified
//! inside or outside, and the kept faces are stitched into a result whose
//! edges are shared by exactly two faces. A final pass removes the vertices
//! that cutting left on flat regions and rejoins triangles into quads.
//!
//! ```
//! use bsp_boolean::solid::Solid;
//! use nalgebra::{Point3, Vector3};
//!
//! let a = Solid::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
//! let b = a.translated(Vector3::new(0.5, 0.5, 0.5));
//! let union = a.union(&b)?;
//! assert!(union.is_closed());
//! assert!((union.volume() - 1.875).abs() < 1e-9);
//! # Ok::<(), bsp_boolean::errors::BooleanOpError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - [**stl-io**](https://en.wikipedia.org/wiki/STL_(file_format)): `.stl` export
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//!
//! The geometric tolerance defaults to `1e-6` (`1e-4` with f32) and can be
//! overridden with the `BSP_BOOLEAN_TOLERANCE` environment variable at build time or
//! [`float_types::set_tolerance`].

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod boolean;
pub mod bsp;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod math;
pub mod mesh;
pub mod output;
pub mod plane;
pub mod solid;
pub mod tag;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use boolean::{BoolOpType, perform_boolean_operation, perform_boolean_operation_with_config};
pub use config::BooleanConfig;
pub use errors::{BooleanOpError, BooleanResult, ResultCode};
pub use output::BooleanMesh;
pub use solid::{FaceRecord, Operand, Solid};
