//! The allocation and kernel-materialisation contract.

use super::{
    BackendError, ConstArray, ConstId, Kernel, MatrixId, MpiMatrixId, MpiViewId, ViewFragments,
    ViewId,
};
use crate::types::Rank;

/// Backend capability consumed by interface sets and element stores.
///
/// All allocations are contiguous and unpadded; a view's point `i`, a
/// constant array's row `i` and an exchange buffer's row `i` always refer
/// to the same interface point.
pub trait InterfaceBackend {
    /// Allocate zeroed element storage of `nrows x ncols`.
    fn matrix(&mut self, nrows: usize, ncols: usize) -> Result<MatrixId, BackendError>;

    /// Allocate an indirect view presenting `vlen` values per point.
    fn view(&mut self, frags: ViewFragments, vlen: usize) -> Result<ViewId, BackendError>;

    /// Allocate an indirect view with its own packed send buffer.
    fn mpi_view(&mut self, frags: ViewFragments, vlen: usize) -> Result<MpiViewId, BackendError>;

    /// Allocate an immutable dense array.
    fn const_matrix(&mut self, data: ConstArray) -> Result<ConstId, BackendError>;

    /// Allocate a dense receive buffer with the shape of `view`.
    fn mpi_matrix_for_view(&mut self, view: MpiViewId) -> Result<MpiMatrixId, BackendError>;

    /// Check that `rank` is a valid exchange partner.
    fn check_peer(&self, rank: Rank) -> Result<(), BackendError>;

    /// Materialise a kernel, validating every handle it references.
    fn kernel(&self, kernel: Kernel) -> Result<Kernel, BackendError>;
}
