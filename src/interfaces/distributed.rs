//! Interfaces whose right side lives on another rank.
//!
//! The lhs view is a distributed view with its own send buffer; the rhs
//! operand is a dense receive buffer of the same shape. One exchange round
//! runs four kernels in order:
//!
//! 1. `pack`: gather the lhs view into its send buffer
//! 2. `send_pack`: post a non-blocking send to the paired rank
//! 3. `recv_pack`: post a non-blocking receive into the rhs buffer
//! 4. `unpack`: complete the receive so the rhs buffer can be read
//!
//! Both directions use [`EXCHANGE_TAG`].

use tracing::debug;

use super::assembly::{mag_pnorm_mat, norm_pnorm_mat, view_mats};
use super::base::InterfaceDims;
use crate::backend::{ConstId, InterfaceBackend, Kernel, MpiMatrixId, MpiViewId};
use crate::comm::Tag;
use crate::elements::{ElementMap, InterfaceSide, ScalarState};
use crate::error::Result;
use crate::types::Rank;

/// Message tag of the interface exchange.
pub const EXCHANGE_TAG: Tag = Tag::new(2314);

/// Operands and exchange protocol shared by every distributed interface set.
#[derive(Clone, Debug)]
pub struct DistributedInterfaces {
    dims: InterfaceDims,
    npts: usize,
    rhs_rank: Rank,
    lhs: MpiViewId,
    rhs: MpiMatrixId,
    mag_pnorm_lhs: ConstId,
    norm_pnorm_lhs: ConstId,
}

impl DistributedInterfaces {
    /// Build the lhs exchange view, the rhs receive buffer and lhs normals.
    ///
    /// `lhs` must be ordered the same way the peer orders its own list for
    /// this rank, so the exchanged buffers line up point for point.
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs_rank: Rank,
        elemap: &ElementMap,
    ) -> Result<Self> {
        backend.check_peer(rhs_rank)?;
        let dims = InterfaceDims::from_elements(elemap)?;

        let frags = view_mats(lhs, ScalarState::Primary, elemap)?;
        let npts = frags.npts();
        let mag = mag_pnorm_mat(lhs, elemap)?;
        let norm = norm_pnorm_mat(lhs, elemap)?;

        let lhs_view = backend.mpi_view(frags, dims.nvars)?;
        let set = Self {
            dims,
            npts,
            rhs_rank,
            lhs: lhs_view,
            rhs: backend.mpi_matrix_for_view(lhs_view)?,
            mag_pnorm_lhs: backend.const_matrix(mag)?,
            norm_pnorm_lhs: backend.const_matrix(norm)?,
        };

        debug!(
            interfaces = lhs.len(),
            npts,
            peer = %rhs_rank,
            "built distributed interfaces"
        );
        Ok(set)
    }

    pub fn dims(&self) -> InterfaceDims {
        self.dims
    }

    /// Interface points exchanged per round.
    pub fn npts(&self) -> usize {
        self.npts
    }

    /// Rank holding the right sides.
    pub fn rhs_rank(&self) -> Rank {
        self.rhs_rank
    }

    pub fn lhs_view(&self) -> MpiViewId {
        self.lhs
    }

    pub fn rhs_matrix(&self) -> MpiMatrixId {
        self.rhs
    }

    pub fn mag_pnorm_lhs(&self) -> ConstId {
        self.mag_pnorm_lhs
    }

    pub fn norm_pnorm_lhs(&self) -> ConstId {
        self.norm_pnorm_lhs
    }

    /// Gather the lhs view into its send buffer.
    pub fn pack_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        Ok(backend.kernel(Kernel::Pack { view: self.lhs })?)
    }

    /// Send the packed buffer to the paired rank.
    pub fn send_pack_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        Ok(backend.kernel(Kernel::SendPack {
            view: self.lhs,
            rank: self.rhs_rank,
            tag: EXCHANGE_TAG,
        })?)
    }

    /// Receive the peer's packed buffer into the rhs matrix.
    pub fn recv_pack_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        Ok(backend.kernel(Kernel::RecvPack {
            matrix: self.rhs,
            rank: self.rhs_rank,
            tag: EXCHANGE_TAG,
        })?)
    }

    /// Complete the receive.
    pub fn unpack_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        Ok(backend.kernel(Kernel::Unpack { matrix: self.rhs })?)
    }

    /// The four exchange kernels in execution order.
    pub fn exchange_kernels(&self, backend: &impl InterfaceBackend) -> Result<[Kernel; 4]> {
        Ok([
            self.pack_kernel(backend)?,
            self.send_pack_kernel(backend)?,
            self.recv_pack_kernel(backend)?,
            self.unpack_kernel(backend)?,
        ])
    }
}
