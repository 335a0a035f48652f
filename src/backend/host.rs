//! CPU reference backend.
//!
//! Storage is `faer::Mat<f64>` throughout. Views are validated when they
//! are allocated, so gathers never go out of bounds at run time.

use faer::Mat;

use super::{
    BackendError, ConstArray, ConstId, InterfaceBackend, Kernel, MatrixId, MpiMatrixId, MpiViewId,
    Operand, ViewFragments, ViewId,
};
use crate::comm::{CommError, PendingRecv, Transport};
use crate::types::Rank;

/// Validated indirect view.
#[derive(Clone, Debug)]
struct HostView {
    frags: ViewFragments,
    vlen: usize,
}

impl HostView {
    fn npts(&self) -> usize {
        self.frags.npts()
    }
}

struct HostMpiView {
    view: HostView,
    packed: Mat<f64>,
}

struct HostMpiMatrix {
    buf: Mat<f64>,
    pending: Option<Box<dyn PendingRecv>>,
}

/// CPU backend holding element storage, operands and exchange buffers.
///
/// # Example
///
/// ```
/// use fr_rs::backend::{HostBackend, InterfaceBackend, ViewFragments};
///
/// let mut be = HostBackend::new();
/// let m = be.matrix(2, 6).unwrap();
/// be.matrix_mut(m).unwrap()[(1, 4)] = 7.0;
///
/// // One point at (row 1, col 0) with 3 variables spaced 2 columns apart
/// let mut frags = ViewFragments::default();
/// frags.push(m, 1, 0, 2);
/// let view = be.view(frags, 3).unwrap();
///
/// let gathered = be.gather_view(view).unwrap();
/// assert_eq!(gathered[(0, 2)], 7.0);
/// ```
#[derive(Default)]
pub struct HostBackend {
    matrices: Vec<Mat<f64>>,
    views: Vec<HostView>,
    mpi_views: Vec<HostMpiView>,
    consts: Vec<Mat<f64>>,
    mpi_matrices: Vec<HostMpiMatrix>,
    transport: Option<Box<dyn Transport>>,
}

impl HostBackend {
    /// Backend with no transport; distributed operations will fail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that exchanges through `transport`.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Some(Box::new(transport)),
            ..Self::default()
        }
    }

    /// Element storage matrix.
    pub fn matrix_ref(&self, id: MatrixId) -> Result<&Mat<f64>, BackendError> {
        self.matrices
            .get(id.0)
            .ok_or_else(|| BackendError::unknown("matrix", id.0))
    }

    /// Mutable element storage matrix.
    pub fn matrix_mut(&mut self, id: MatrixId) -> Result<&mut Mat<f64>, BackendError> {
        self.matrices
            .get_mut(id.0)
            .ok_or_else(|| BackendError::unknown("matrix", id.0))
    }

    /// Constant array as `npts x width`.
    pub fn const_data(&self, id: ConstId) -> Result<&Mat<f64>, BackendError> {
        self.consts
            .get(id.0)
            .ok_or_else(|| BackendError::unknown("const", id.0))
    }

    /// Packed send buffer of a distributed view, `npts x vlen`.
    pub fn send_buffer(&self, id: MpiViewId) -> Result<&Mat<f64>, BackendError> {
        self.mpi_views
            .get(id.0)
            .map(|v| &v.packed)
            .ok_or_else(|| BackendError::unknown("mpi view", id.0))
    }

    /// Dense receive buffer, `npts x vlen`.
    pub fn recv_buffer(&self, id: MpiMatrixId) -> Result<&Mat<f64>, BackendError> {
        self.mpi_matrices
            .get(id.0)
            .map(|m| &m.buf)
            .ok_or_else(|| BackendError::unknown("mpi matrix", id.0))
    }

    /// Number of points presented by a view.
    pub fn view_npts(&self, id: ViewId) -> Result<usize, BackendError> {
        self.host_view(id).map(HostView::npts)
    }

    /// Read a view into a dense `npts x vlen` matrix.
    pub fn gather_view(&self, id: ViewId) -> Result<Mat<f64>, BackendError> {
        let view = self.host_view(id)?;
        Ok(gather(view, &self.matrices))
    }

    /// Read a distributed view's current storage into a dense matrix.
    pub fn gather_mpi_view(&self, id: MpiViewId) -> Result<Mat<f64>, BackendError> {
        let view = self.host_mpi_view(id)?;
        Ok(gather(&view.view, &self.matrices))
    }

    /// Execute kernels in order.
    ///
    /// Exchange primitives are executed here; compute kernels are only
    /// described by this backend and are rejected.
    pub fn run(&mut self, kernels: &[Kernel]) -> Result<(), BackendError> {
        for kernel in kernels {
            tracing::trace!(kernel = kernel.name(), "running host kernel");
            self.run_one(kernel).inspect_err(|err| {
                tracing::warn!(kernel = kernel.name(), %err, "host kernel failed");
            })?;
        }
        Ok(())
    }

    /// Complete every outstanding receive.
    pub fn wait_all(&mut self) -> Result<(), BackendError> {
        for index in 0..self.mpi_matrices.len() {
            self.complete_recv(MpiMatrixId(index))?;
        }
        Ok(())
    }

    fn run_one(&mut self, kernel: &Kernel) -> Result<(), BackendError> {
        match kernel {
            Kernel::Pack { view } => {
                let packed = {
                    let mpi_view = self.host_mpi_view(*view)?;
                    gather(&mpi_view.view, &self.matrices)
                };
                self.mpi_views[view.0].packed = packed;
                Ok(())
            }
            Kernel::SendPack { view, rank, tag } => {
                let buf = flatten(&self.host_mpi_view(*view)?.packed);
                self.transport()?.isend(*rank, *tag, buf)?;
                Ok(())
            }
            Kernel::RecvPack { matrix, rank, tag } => {
                let len = {
                    let target = self.host_mpi_matrix(*matrix)?;
                    if target.pending.is_some() {
                        return Err(BackendError::ReceivePending(matrix.0));
                    }
                    target.buf.nrows() * target.buf.ncols()
                };
                let pending = self.transport()?.irecv(*rank, *tag, len)?;
                self.mpi_matrices[matrix.0].pending = Some(pending);
                Ok(())
            }
            Kernel::Unpack { matrix } => {
                if self.host_mpi_matrix(*matrix)?.pending.is_none() {
                    tracing::warn!(buffer = matrix.0, "unpack with no receive posted");
                }
                self.complete_recv(*matrix)
            }
            Kernel::Compute(k) => Err(BackendError::UnsupportedKernel(k.name.clone())),
        }
    }

    fn complete_recv(&mut self, id: MpiMatrixId) -> Result<(), BackendError> {
        let target = self
            .mpi_matrices
            .get_mut(id.0)
            .ok_or_else(|| BackendError::unknown("mpi matrix", id.0))?;

        if let Some(pending) = target.pending.take() {
            let (peer, tag) = (pending.peer(), pending.tag());
            let data = pending.wait()?;
            let (nrows, ncols) = (target.buf.nrows(), target.buf.ncols());
            if data.len() != nrows * ncols {
                return Err(CommError::size_mismatch(peer, tag, nrows * ncols, data.len()).into());
            }
            target.buf = Mat::from_fn(nrows, ncols, |i, k| data[i * ncols + k]);
        }
        Ok(())
    }

    fn transport(&self) -> Result<&dyn Transport, BackendError> {
        self.transport.as_deref().ok_or(BackendError::NoTransport)
    }

    fn host_view(&self, id: ViewId) -> Result<&HostView, BackendError> {
        self.views
            .get(id.0)
            .ok_or_else(|| BackendError::unknown("view", id.0))
    }

    fn host_mpi_view(&self, id: MpiViewId) -> Result<&HostMpiView, BackendError> {
        self.mpi_views
            .get(id.0)
            .ok_or_else(|| BackendError::unknown("mpi view", id.0))
    }

    fn host_mpi_matrix(&self, id: MpiMatrixId) -> Result<&HostMpiMatrix, BackendError> {
        self.mpi_matrices
            .get(id.0)
            .ok_or_else(|| BackendError::unknown("mpi matrix", id.0))
    }

    fn validate_view(&self, frags: ViewFragments, vlen: usize) -> Result<HostView, BackendError> {
        let npts = frags
            .check_widths()
            .map_err(|(expected, actual)| {
                BackendError::InvalidLayout(format!("expected {expected}, got {actual}"))
            })?;

        for i in 0..npts {
            let mat = self.matrix_ref(frags.mats[i])?;
            let (row, col) = frags.location(i);
            let last_col = col + vlen.saturating_sub(1) * frags.stride[i];
            if row >= mat.nrows() || last_col >= mat.ncols() {
                return Err(BackendError::InvalidLayout(format!(
                    "point {i} reaches ({row}, {last_col}) in a {}x{} matrix",
                    mat.nrows(),
                    mat.ncols()
                )));
            }
        }

        Ok(HostView { frags, vlen })
    }

    fn validate_operand(&self, operand: &Operand) -> Result<(), BackendError> {
        match *operand {
            Operand::View(id) => self.host_view(id).map(|_| ()),
            Operand::MpiView(id) => self.host_mpi_view(id).map(|_| ()),
            Operand::Const(id) => self.const_data(id).map(|_| ()),
            Operand::MpiMatrix(id) => self.host_mpi_matrix(id).map(|_| ()),
        }
    }
}

impl InterfaceBackend for HostBackend {
    fn matrix(&mut self, nrows: usize, ncols: usize) -> Result<MatrixId, BackendError> {
        self.matrices.push(Mat::zeros(nrows, ncols));
        Ok(MatrixId(self.matrices.len() - 1))
    }

    fn view(&mut self, frags: ViewFragments, vlen: usize) -> Result<ViewId, BackendError> {
        let view = self.validate_view(frags, vlen)?;
        self.views.push(view);
        Ok(ViewId(self.views.len() - 1))
    }

    fn mpi_view(&mut self, frags: ViewFragments, vlen: usize) -> Result<MpiViewId, BackendError> {
        let view = self.validate_view(frags, vlen)?;
        let packed = Mat::zeros(view.npts(), vlen);
        self.mpi_views.push(HostMpiView { view, packed });
        Ok(MpiViewId(self.mpi_views.len() - 1))
    }

    fn const_matrix(&mut self, data: ConstArray) -> Result<ConstId, BackendError> {
        let width = data.width();
        let values = data.as_slice();
        self.consts
            .push(Mat::from_fn(data.npts(), width, |i, j| values[i * width + j]));
        Ok(ConstId(self.consts.len() - 1))
    }

    fn mpi_matrix_for_view(&mut self, view: MpiViewId) -> Result<MpiMatrixId, BackendError> {
        let (npts, vlen) = {
            let v = self.host_mpi_view(view)?;
            (v.view.npts(), v.view.vlen)
        };
        self.mpi_matrices.push(HostMpiMatrix {
            buf: Mat::zeros(npts, vlen),
            pending: None,
        });
        Ok(MpiMatrixId(self.mpi_matrices.len() - 1))
    }

    fn check_peer(&self, rank: Rank) -> Result<(), BackendError> {
        self.transport()?.check_rank(rank)?;
        Ok(())
    }

    fn kernel(&self, kernel: Kernel) -> Result<Kernel, BackendError> {
        match &kernel {
            Kernel::Pack { view } => {
                self.host_mpi_view(*view)?;
            }
            Kernel::SendPack { view, rank, .. } => {
                self.host_mpi_view(*view)?;
                self.check_peer(*rank)?;
            }
            Kernel::RecvPack { matrix, rank, .. } => {
                self.host_mpi_matrix(*matrix)?;
                self.check_peer(*rank)?;
            }
            Kernel::Unpack { matrix } => {
                self.host_mpi_matrix(*matrix)?;
            }
            Kernel::Compute(k) => {
                for operand in &k.operands {
                    self.validate_operand(operand)?;
                }
            }
        }
        Ok(kernel)
    }
}

/// Gather `view` from `matrices` into a dense `npts x vlen` matrix.
#[cfg(not(feature = "parallel"))]
fn gather(view: &HostView, matrices: &[Mat<f64>]) -> Mat<f64> {
    let frags = &view.frags;
    Mat::from_fn(view.npts(), view.vlen, |i, k| {
        let (row, col) = frags.location(i);
        matrices[frags.mats[i].0][(row, col + k * frags.stride[i])]
    })
}

/// Gather `view` from `matrices` into a dense `npts x vlen` matrix, one
/// rayon task per point.
#[cfg(feature = "parallel")]
fn gather(view: &HostView, matrices: &[Mat<f64>]) -> Mat<f64> {
    use rayon::prelude::*;

    let frags = &view.frags;
    let vlen = view.vlen;
    let data: Vec<f64> = (0..view.npts())
        .into_par_iter()
        .flat_map_iter(|i| {
            let (row, col) = frags.location(i);
            let mat = &matrices[frags.mats[i].0];
            let stride = frags.stride[i];
            (0..vlen).map(move |k| mat[(row, col + k * stride)])
        })
        .collect();
    Mat::from_fn(view.npts(), vlen, |i, k| data[i * vlen + k])
}

/// Row-major copy of a dense matrix.
fn flatten(mat: &Mat<f64>) -> Vec<f64> {
    let mut out = Vec::with_capacity(mat.nrows() * mat.ncols());
    for i in 0..mat.nrows() {
        for k in 0..mat.ncols() {
            out.push(mat[(i, k)]);
        }
    }
    out
}
