//! Transport capability consumed by the exchange kernels.

use std::fmt;

use super::CommError;
use crate::types::Rank;

/// Message tag. Receives match on (source rank, tag) only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tag(i32);

impl Tag {
    /// Create a tag from its literal value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw tag value.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag{}", self.0)
    }
}

/// A posted receive that has not completed yet.
pub trait PendingRecv: Send {
    /// Rank the message is expected from.
    fn peer(&self) -> Rank;

    /// Tag the message is expected under.
    fn tag(&self) -> Tag;

    /// Block until the message arrives and return its payload.
    ///
    /// The payload length is checked against the length given at post time.
    fn wait(self: Box<Self>) -> Result<Vec<f64>, CommError>;
}

/// Point-to-point transport between the ranks of a run.
///
/// Sends must not block: the buffer is handed over and the call returns.
/// Receives are posted and completed later through [`PendingRecv::wait`].
pub trait Transport: Send + Sync {
    /// Rank of this endpoint.
    fn rank(&self) -> Rank;

    /// Number of ranks in the world.
    fn size(&self) -> usize;

    /// Post a send of `buf` to `dest` under `tag`.
    fn isend(&self, dest: Rank, tag: Tag, buf: Vec<f64>) -> Result<(), CommError>;

    /// Post a receive of exactly `len` values from `source` under `tag`.
    fn irecv(&self, source: Rank, tag: Tag, len: usize) -> Result<Box<dyn PendingRecv>, CommError>;

    /// Check that `rank` names a member of this world.
    fn check_rank(&self, rank: Rank) -> Result<(), CommError> {
        if rank.get() < self.size() {
            Ok(())
        } else {
            Err(CommError::InvalidRank {
                rank,
                size: self.size(),
            })
        }
    }
}
