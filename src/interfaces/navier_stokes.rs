//! Compressible Navier-Stokes interface sets.
//!
//! On top of the convective operands these carry views over the auxiliary
//! scalar state, written by the common-solution kernel (`conu_*`).

use tracing::debug;

use super::assembly::view_mats;
use super::base::RsolveKernel;
use super::distributed::DistributedInterfaces;
use super::euler::{ConvectiveParams, distributed_operands, internal_operands};
use super::internal::{InternalInterfaces, view_pair};
use crate::backend::{ComputeKernel, InterfaceBackend, Kernel, MpiViewId, Operand, ViewId};
use crate::config::Config;
use crate::elements::{ElementMap, InterfaceSide, ScalarState};
use crate::error::Result;
use crate::types::Rank;

/// Navier-Stokes interfaces within one partition.
#[derive(Clone, Debug)]
pub struct NavierStokesInternal {
    base: InternalInterfaces,
    params: ConvectiveParams,
    ldg_beta: f64,
    aux_lhs: ViewId,
    aux_rhs: ViewId,
}

impl NavierStokesInternal {
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs: &[InterfaceSide],
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        let params = ConvectiveParams::viscous(cfg)?;
        let base = InternalInterfaces::new(backend, lhs, rhs, elemap, &cfg.interfaces)?;

        let (aux_lhs, aux_rhs) = view_pair(lhs, rhs, ScalarState::Auxiliary, elemap)?;
        let nvars = base.dims().nvars;
        let set = Self {
            params,
            ldg_beta: cfg.interfaces.ldg_beta,
            aux_lhs: backend.view(aux_lhs, nvars)?,
            aux_rhs: backend.view(aux_rhs, nvars)?,
            base,
        };

        debug!(npts = set.base.npts(), "built viscous internal interfaces");
        Ok(set)
    }

    pub fn base(&self) -> &InternalInterfaces {
        &self.base
    }

    pub fn aux_lhs_view(&self) -> ViewId {
        self.aux_lhs
    }

    pub fn aux_rhs_view(&self) -> ViewId {
        self.aux_rhs
    }

    /// Common interface solution, written into the auxiliary views.
    pub fn conu_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        let dims = self.base.dims();
        let kern = ComputeKernel::new("conu_int", dims.ndims, dims.nvars)
            .operand(Operand::View(self.base.lhs_view()))
            .operand(Operand::View(self.base.rhs_view()))
            .operand(Operand::View(self.aux_lhs))
            .operand(Operand::View(self.aux_rhs))
            .param("ldg_beta", self.ldg_beta);
        Ok(backend.kernel(kern.into())?)
    }
}

impl RsolveKernel for NavierStokesInternal {
    fn rsolve_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        let kern = self
            .params
            .kernel("int", self.base.dims(), internal_operands(&self.base));
        Ok(backend.kernel(kern.into())?)
    }
}

/// Navier-Stokes interfaces shared with one remote rank.
///
/// Only the lhs auxiliary view exists; the remote side writes its own.
#[derive(Clone, Debug)]
pub struct NavierStokesDistributed {
    base: DistributedInterfaces,
    params: ConvectiveParams,
    ldg_beta: f64,
    aux_lhs: MpiViewId,
}

impl NavierStokesDistributed {
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs_rank: Rank,
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        let params = ConvectiveParams::viscous(cfg)?;
        let base = DistributedInterfaces::new(backend, lhs, rhs_rank, elemap)?;

        let aux_lhs = view_mats(lhs, ScalarState::Auxiliary, elemap)?;
        let set = Self {
            params,
            ldg_beta: cfg.interfaces.ldg_beta,
            aux_lhs: backend.mpi_view(aux_lhs, base.dims().nvars)?,
            base,
        };

        debug!(npts = set.base.npts(), peer = %rhs_rank, "built viscous distributed interfaces");
        Ok(set)
    }

    pub fn base(&self) -> &DistributedInterfaces {
        &self.base
    }

    pub fn aux_lhs_view(&self) -> MpiViewId {
        self.aux_lhs
    }

    /// Common interface solution against the received remote state.
    pub fn conu_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        let dims = self.base.dims();
        let kern = ComputeKernel::new("conu_mpi", dims.ndims, dims.nvars)
            .operand(Operand::MpiView(self.base.lhs_view()))
            .operand(Operand::MpiMatrix(self.base.rhs_matrix()))
            .operand(Operand::MpiView(self.aux_lhs))
            .param("ldg_beta", self.ldg_beta);
        Ok(backend.kernel(kern.into())?)
    }
}

impl RsolveKernel for NavierStokesDistributed {
    fn rsolve_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        let kern = self
            .params
            .kernel("mpi", self.base.dims(), distributed_operands(&self.base));
        Ok(backend.kernel(kern.into())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;
    use crate::comm::LocalWorld;
    use crate::config::{EquationSystem, InterfaceOptions};
    use crate::elements::{ElementType, FaceShape, FluxPointElements};
    use crate::error::InterfaceError;

    fn viscous_cfg() -> Config {
        Config::default()
            .with_constant("gamma", 1.4)
            .with_constant("mu", 1e-3)
            .with_system(EquationSystem::NavierStokes)
            .with_interfaces(InterfaceOptions::default().with_ldg_beta(0.25))
    }

    fn quads(be: &mut HostBackend, aux: bool) -> ElementMap {
        let q = FluxPointElements::new(be, ElementType::Quad, 4, 2, &[(FaceShape::Line, 2); 4]).unwrap();
        let q = if aux { q.with_auxiliary(be).unwrap() } else { q };
        ElementMap::new().with(q)
    }

    #[test]
    fn test_internal_kernels() {
        let mut be = HostBackend::new();
        let map = quads(&mut be, true);
        let lhs = [InterfaceSide::new(ElementType::Quad, 0, 1, 0)];
        let rhs = [InterfaceSide::new(ElementType::Quad, 1, 3, 1)];
        let set = NavierStokesInternal::new(&mut be, &lhs, &rhs, &map, &viscous_cfg()).unwrap();

        assert_eq!(be.view_npts(set.aux_lhs_view()).unwrap(), 2);

        let conu = set.conu_kernel(&be).unwrap();
        let conu = conu.as_compute().unwrap();
        assert_eq!(conu.name, "conu_int");
        assert_eq!(conu.operands.len(), 4);
        assert_eq!(conu.get_param("ldg_beta"), Some(0.25));

        let rsolve = set.rsolve_kernel(&be).unwrap();
        let rsolve = rsolve.as_compute().unwrap();
        assert_eq!(rsolve.name, "rsolve_rus_inv_int");
        assert_eq!(rsolve.get_param("mu"), Some(1e-3));
    }

    #[test]
    fn test_inviscid_store_rejected() {
        let mut be = HostBackend::new();
        let map = quads(&mut be, false);
        let lhs = [InterfaceSide::new(ElementType::Quad, 0, 1, 0)];
        let rhs = [InterfaceSide::new(ElementType::Quad, 1, 3, 1)];
        let err = NavierStokesInternal::new(&mut be, &lhs, &rhs, &map, &viscous_cfg()).unwrap_err();
        assert!(matches!(
            err,
            InterfaceError::UnsupportedElementType { accessor: "scal_fpts_auxiliary", .. }
        ));
    }

    #[test]
    fn test_distributed_kernels() {
        let world = LocalWorld::new(2);
        let mut be = HostBackend::with_transport(world.transport(Rank::new(0)).unwrap());
        let map = quads(&mut be, true);
        let lhs = [InterfaceSide::new(ElementType::Quad, 1, 1, 0)];
        let set = NavierStokesDistributed::new(&mut be, &lhs, Rank::new(1), &map, &viscous_cfg()).unwrap();

        let conu = set.conu_kernel(&be).unwrap();
        assert_eq!(conu.name(), "conu_mpi");
        assert_eq!(conu.as_compute().unwrap().operands.len(), 3);
        assert_eq!(set.rsolve_kernel(&be).unwrap().name(), "rsolve_rus_inv_mpi");
        assert_eq!(set.conu_kernel(&be).unwrap(), conu);
    }
}
