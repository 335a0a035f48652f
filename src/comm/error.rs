//! Errors raised by transports.

use std::time::Duration;

use thiserror::Error;

use super::Tag;
use crate::types::Rank;

/// Transport-level failure. The interface layer treats all of these as fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommError {
    /// Peer rank outside the world.
    #[error("Invalid rank {rank}: world size is {size}")]
    InvalidRank { rank: Rank, size: usize },

    /// A message arrived with a length other than the receive buffer's.
    #[error("Size mismatch from {peer} on {tag}: expected {expected} values, got {actual}")]
    SizeMismatch {
        peer: Rank,
        tag: Tag,
        expected: usize,
        actual: usize,
    },

    /// No matching message arrived within the configured timeout.
    #[error("Timed out after {waited:?} waiting for {peer} on {tag}")]
    Timeout {
        peer: Rank,
        tag: Tag,
        waited: Duration,
    },

    /// The peer's endpoint is gone or the transport itself failed.
    ///
    /// Raised by transports that can detect a lost peer. [`LocalWorld`]
    /// never does; a stalled peer there ends in [`CommError::Timeout`] when
    /// a timeout is set.
    ///
    /// [`LocalWorld`]: super::LocalWorld
    #[error("Transport fault: {0}")]
    Transport(String),
}

impl CommError {
    /// Create a size mismatch error.
    pub fn size_mismatch(peer: Rank, tag: Tag, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            peer,
            tag,
            expected,
            actual,
        }
    }
}
