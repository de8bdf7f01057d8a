//! Errors surfaced by boolean operations

use crate::mesh::{EdgeId, VertexId};
use crate::solid::Operand;

/// Flat status for hosts that only need the three result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// The operation produced a result mesh.
    Ok,
    /// An operand was not a closed solid.
    NoSolid,
    /// Any other failure.
    Error,
}

/// Everything that can make a boolean operation fail.
///
/// Geometric degeneracies met while splitting (collinear fragments, skipped
/// adjacency lookups) are never errors; they become face and vertex tags.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BooleanOpError {
    /// An operand enumerated no vertices
    #[error("operand {operand} has no vertices")]
    EmptyMesh { operand: Operand },

    /// A face record points past the end of its operand's vertices
    #[error(
        "operand {operand} face {face} references vertex {vertex}, but only {vertex_count} vertices were supplied"
    )]
    InvalidFace {
        operand: Operand,
        face: usize,
        vertex: usize,
        vertex_count: usize,
    },

    /// Operation selector outside union/intersection/difference
    #[error("unsupported boolean operation: {0}")]
    UnsupportedOperation(String),

    /// Reserved for manifold precondition checks; not produced today
    #[error("operand is not a closed solid")]
    NoSolid,

    /// The self-check found an edge bordered by an odd number of live faces
    #[error("edge {edge} ({}, {}) borders {faces} live faces", vertices[0], vertices[1])]
    TopologyInconsistency {
        edge: EdgeId,
        vertices: [VertexId; 2],
        faces: usize,
    },

    /// Output buffers could not be reserved
    #[error("could not allocate {what}")]
    AllocationFailed { what: &'static str },
}

impl BooleanOpError {
    /// Maps the error onto the flat result-code set.
    pub const fn code(&self) -> ResultCode {
        match self {
            BooleanOpError::NoSolid => ResultCode::NoSolid,
            _ => ResultCode::Error,
        }
    }
}

/// Result alias used throughout the crate.
pub type BooleanResult<T> = Result<T, BooleanOpError>;
