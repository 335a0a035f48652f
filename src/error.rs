//! Crate-wide error type for interface construction and exchange.

use thiserror::Error;

use crate::backend::BackendError;
use crate::comm::CommError;
use crate::config::ConfigError;
use crate::elements::ElementType;

/// Errors raised while building interface sets or running their exchange.
///
/// Construction never hands out a partially built interface set: every
/// constructor returns `Result<Self, InterfaceError>`.
#[derive(Error, Debug)]
pub enum InterfaceError {
    /// The element map has no accessor for a type, or the accessor lacks
    /// the requested capability.
    #[error("Unsupported element type {etype}: no `{accessor}` accessor")]
    UnsupportedElementType {
        etype: ElementType,
        accessor: &'static str,
    },

    /// Paired lists, point counts or fragment widths disagree.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Exchange with a remote rank failed. Fatal; never retried here.
    #[error("Communication failure: {0}")]
    CommunicationFailure(#[from] CommError),

    /// The rhs unit normal is not the negated lhs unit normal.
    #[error("Inconsistent normals at interface point {point}: |n_lhs + n_rhs| = {deviation:e}")]
    InconsistentNormals { point: usize, deviation: f64 },

    /// Backend allocation or kernel materialisation failed.
    #[error("Backend error: {0}")]
    Backend(BackendError),

    /// Configuration is missing a constant or could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl InterfaceError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported element type error.
    pub fn unsupported(etype: ElementType, accessor: &'static str) -> Self {
        Self::UnsupportedElementType { etype, accessor }
    }
}

// Transport faults reported through the backend keep their meaning.
impl From<BackendError> for InterfaceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Communication(comm) => Self::CommunicationFailure(comm),
            other => Self::Backend(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = InterfaceError> = std::result::Result<T, E>;
