//! Error types for backend allocation and kernel execution.

use thiserror::Error;

use crate::comm::CommError;

/// Errors that can occur while allocating operands or running kernels.
#[derive(Error, Debug)]
pub enum BackendError {
    /// A handle does not name an allocation of this backend.
    #[error("Unknown {kind} handle {index}")]
    UnknownHandle { kind: &'static str, index: usize },

    /// View fragments are malformed or point outside their matrix.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// The backend cannot execute this kernel.
    #[error("Unsupported kernel `{0}`")]
    UnsupportedKernel(String),

    /// A distributed operation was requested without a transport.
    #[error("No transport attached to backend")]
    NoTransport,

    /// A receive is already outstanding on this buffer.
    #[error("Receive already pending on exchange buffer {0}")]
    ReceivePending(usize),

    /// The transport failed during an exchange.
    #[error("Communication failed: {0}")]
    Communication(#[from] CommError),

    /// Tensor upload failed.
    #[error("Data transfer failed: {0}")]
    DataTransfer(String),
}

impl BackendError {
    /// Create an unknown handle error.
    pub fn unknown(kind: &'static str, index: usize) -> Self {
        Self::UnknownHandle { kind, index }
    }
}
