//! Knobs for the boolean pipeline.
//!
//! ```
//! use bsp_boolean::BooleanConfig;
//!
//! let config = BooleanConfig::default()
//!     .with_merge_faces(false)
//!     .with_self_check(true);
//! assert!(config.self_check);
//! ```

/// Configuration for one boolean operation.
///
/// Geometric tolerance is global, see [`crate::float_types::tolerance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanConfig {
    /// Recombine split fragments of the same input face into larger
    /// triangles and quads before export.
    pub merge_faces: bool,

    /// Split faces along open edges at boundary vertices lying on them
    /// (repairs T-junctions left by selection).
    pub sew_boundaries: bool,

    /// Verify that every edge borders an even number of live faces and
    /// return [`crate::BooleanOpError::TopologyInconsistency`] if not.
    pub self_check: bool,

    /// Maximum number of faces the pairwise splitting stage may create.
    /// `None` derives a budget from the input size.
    pub face_budget: Option<usize>,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            merge_faces: true,
            sew_boundaries: true,
            self_check: false,
            face_budget: None,
        }
    }
}

impl BooleanConfig {
    /// Raw pipeline output: no merging, no sewing.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            merge_faces: false,
            sew_boundaries: false,
            ..Self::default()
        }
    }

    /// Default pipeline plus the closure self-check.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            self_check: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_merge_faces(mut self, merge: bool) -> Self {
        self.merge_faces = merge;
        self
    }

    #[must_use]
    pub const fn with_sew_boundaries(mut self, sew: bool) -> Self {
        self.sew_boundaries = sew;
        self
    }

    #[must_use]
    pub const fn with_self_check(mut self, check: bool) -> Self {
        self.self_check = check;
        self
    }

    #[must_use]
    pub const fn with_face_budget(mut self, budget: usize) -> Self {
        self.face_budget = Some(budget);
        self
    }

    /// Face budget for an operation over `input_faces` imported faces.
    pub fn effective_face_budget(&self, input_faces: usize) -> usize {
        self.face_budget
            .unwrap_or_else(|| input_faces.saturating_mul(64).saturating_add(4096))
    }
}
