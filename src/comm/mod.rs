//! Message passing between partitions.
//!
//! The interface layer only needs point-to-point, tagged, non-blocking
//! sends and receives of `f64` buffers. [`Transport`] is that capability;
//! [`LocalWorld`] provides an in-process implementation where every rank
//! lives in the same address space, which is what the exchange tests and
//! single-node runs use.

mod error;
mod local;
mod transport;

pub use error::CommError;
pub use local::{LocalTransport, LocalWorld};
pub use transport::{PendingRecv, Tag, Transport};
