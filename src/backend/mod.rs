//! Backend capability consumed by the interface layer.
//!
//! Interface sets never touch solution storage directly. They hand the
//! backend flat operand descriptions (views, constant arrays, exchange
//! buffers) and get opaque handles back; kernels are then described in
//! terms of those handles and scheduled by whoever drives the time loop.
//!
//! # Backends
//!
//! - [`HostBackend`]: CPU reference implementation over `faer` matrices.
//!   Executes the exchange primitives (`pack`, `send_pack`, `recv_pack`,
//!   `unpack`) and can gather any view for inspection.
//! - [`tensor`] (feature `burn`): uploads host operands as `Tensor<B, 3>` of
//!   shape `[1, npts, width]` for device kernels.

mod error;
mod handles;
mod host;
mod kernel;
mod layout;
#[cfg(feature = "burn")]
pub mod tensor;
mod traits;

pub use error::BackendError;
pub use handles::{ConstId, MatrixId, MpiMatrixId, MpiViewId, ViewId};
pub use host::HostBackend;
pub use kernel::{ComputeKernel, Kernel, Operand};
pub use layout::{ConstArray, ViewFragments};
pub use traits::InterfaceBackend;
