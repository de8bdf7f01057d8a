// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized tolerance shared by every geometric predicate.
/// Defaults depend on precision (`f32` vs `f64`), but can be overridden:
///  1) **Build-time**: set env var `BSP_BOOLEAN_TOLERANCE` (e.g. `BSP_BOOLEAN_TOLERANCE=1e-7 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before running any operation
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
fn default_tolerance() -> Real {
    #[cfg(feature = "f32")]
    {
        1e-4
    }
    #[cfg(feature = "f64")]
    {
        1e-6
    }
}

/// Returns the current epsilon value.
/// If not set yet, it tries `BSP_BOOLEAN_TOLERANCE` (parsed as the active `Real`)
/// and falls back to the precision default.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        if let Some(environment_variable) = option_env!("BSP_BOOLEAN_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set epsilon programmatically once (subsequent calls are ignored).
/// Call near program start: `bsp_boolean::float_types::set_tolerance(1e-7);`
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// Squared tolerance, used for comparisons against squared lengths and
/// cross-product magnitudes.
#[inline]
pub fn tolerance_squared() -> Real {
    let eps = tolerance();
    eps * eps
}
