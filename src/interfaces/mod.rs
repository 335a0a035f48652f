//! Interface sets: flat kernel operands over element faces.
//!
//! An interface set is built once from side lists and an [`ElementMap`]. It
//! owns backend handles for views, normals and (for distributed sets)
//! exchange buffers, and afterwards only describes kernels over them.
//!
//! ```text
//!   side lists ──► assembly ──► views / normals ──► backend handles
//!                                                      │
//!   config ──► equation adapter ──► rsolve / conu / exchange kernels
//! ```
//!
//! The four equation adapters form the closed set [`InterfaceSet`];
//! [`EquationSystem`] in the configuration picks the pair that is built.

pub mod assembly;
pub mod base;
pub mod distributed;
pub mod euler;
pub mod internal;
pub mod navier_stokes;

pub use assembly::{mag_pnorm_mat, norm_pnorm_mat, view_mats};
pub use base::{InterfaceDims, RsolveKernel};
pub use distributed::{DistributedInterfaces, EXCHANGE_TAG};
pub use euler::{EulerDistributed, EulerInternal};
pub use internal::{InternalInterfaces, check_opposed_normals};
pub use navier_stokes::{NavierStokesDistributed, NavierStokesInternal};

use crate::backend::{InterfaceBackend, Kernel};
use crate::config::{Config, EquationSystem};
use crate::elements::{ElementMap, InterfaceSide};
use crate::error::Result;
use crate::types::Rank;

/// Any interface set, dispatched by equation system and locality.
#[derive(Clone, Debug)]
pub enum InterfaceSet {
    EulerInternal(EulerInternal),
    EulerDistributed(EulerDistributed),
    NavierStokesInternal(NavierStokesInternal),
    NavierStokesDistributed(NavierStokesDistributed),
}

impl InterfaceSet {
    /// Internal set for the configured equation system.
    pub fn internal<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs: &[InterfaceSide],
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        Ok(match cfg.solver.system {
            EquationSystem::Euler => {
                Self::EulerInternal(EulerInternal::new(backend, lhs, rhs, elemap, cfg)?)
            }
            EquationSystem::NavierStokes => Self::NavierStokesInternal(NavierStokesInternal::new(
                backend, lhs, rhs, elemap, cfg,
            )?),
        })
    }

    /// Distributed set towards `rhs_rank` for the configured equation system.
    pub fn distributed<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs_rank: Rank,
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        Ok(match cfg.solver.system {
            EquationSystem::Euler => Self::EulerDistributed(EulerDistributed::new(
                backend, lhs, rhs_rank, elemap, cfg,
            )?),
            EquationSystem::NavierStokes => Self::NavierStokesDistributed(
                NavierStokesDistributed::new(backend, lhs, rhs_rank, elemap, cfg)?,
            ),
        })
    }

    /// Interface points per side.
    pub fn npts(&self) -> usize {
        match self {
            Self::EulerInternal(s) => s.base().npts(),
            Self::EulerDistributed(s) => s.base().npts(),
            Self::NavierStokesInternal(s) => s.base().npts(),
            Self::NavierStokesDistributed(s) => s.base().npts(),
        }
    }

    pub fn dims(&self) -> InterfaceDims {
        match self {
            Self::EulerInternal(s) => s.base().dims(),
            Self::EulerDistributed(s) => s.base().dims(),
            Self::NavierStokesInternal(s) => s.base().dims(),
            Self::NavierStokesDistributed(s) => s.base().dims(),
        }
    }

    /// Peer rank of a distributed set.
    pub fn rhs_rank(&self) -> Option<Rank> {
        self.distributed_base().map(DistributedInterfaces::rhs_rank)
    }

    /// Shared exchange state of a distributed set.
    pub fn distributed_base(&self) -> Option<&DistributedInterfaces> {
        match self {
            Self::EulerDistributed(s) => Some(s.base()),
            Self::NavierStokesDistributed(s) => Some(s.base()),
            _ => None,
        }
    }

    /// Common-solution kernel, present for viscous systems.
    pub fn conu_kernel(&self, backend: &impl InterfaceBackend) -> Result<Option<Kernel>> {
        match self {
            Self::NavierStokesInternal(s) => s.conu_kernel(backend).map(Some),
            Self::NavierStokesDistributed(s) => s.conu_kernel(backend).map(Some),
            _ => Ok(None),
        }
    }

    /// Exchange kernels in execution order, present for distributed sets.
    pub fn exchange_kernels(&self, backend: &impl InterfaceBackend) -> Result<Option<[Kernel; 4]>> {
        self.distributed_base()
            .map(|base| base.exchange_kernels(backend))
            .transpose()
    }
}

impl RsolveKernel for InterfaceSet {
    fn rsolve_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        match self {
            Self::EulerInternal(s) => s.rsolve_kernel(backend),
            Self::EulerDistributed(s) => s.rsolve_kernel(backend),
            Self::NavierStokesInternal(s) => s.rsolve_kernel(backend),
            Self::NavierStokesDistributed(s) => s.rsolve_kernel(backend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HostBackend;
    use crate::comm::LocalWorld;
    use crate::elements::{ElementType, FaceShape, FluxPointElements};

    fn map(be: &mut HostBackend) -> ElementMap {
        let q = FluxPointElements::new(be, ElementType::Quad, 4, 2, &[(FaceShape::Line, 2); 4])
            .unwrap()
            .with_auxiliary(be)
            .unwrap();
        ElementMap::new().with(q)
    }

    #[test]
    fn test_system_selects_variant() {
        let mut be = HostBackend::new();
        let map = map(&mut be);
        let lhs = [InterfaceSide::new(ElementType::Quad, 0, 1, 0)];
        let rhs = [InterfaceSide::new(ElementType::Quad, 1, 3, 1)];

        let euler = Config::default().with_constant("gamma", 1.4);
        let set = InterfaceSet::internal(&mut be, &lhs, &rhs, &map, &euler).unwrap();
        assert!(matches!(set, InterfaceSet::EulerInternal(_)));
        assert!(set.conu_kernel(&be).unwrap().is_none());
        assert!(set.exchange_kernels(&be).unwrap().is_none());
        assert_eq!(set.rhs_rank(), None);

        let ns = euler.with_system(EquationSystem::NavierStokes);
        let set = InterfaceSet::internal(&mut be, &lhs, &rhs, &map, &ns).unwrap();
        assert!(matches!(set, InterfaceSet::NavierStokesInternal(_)));
        assert_eq!(set.conu_kernel(&be).unwrap().unwrap().name(), "conu_int");
        assert_eq!(set.npts(), 2);
    }

    #[test]
    fn test_distributed_variant() {
        let world = LocalWorld::new(2);
        let mut be = HostBackend::with_transport(world.transport(Rank::new(1)).unwrap());
        let map = map(&mut be);
        let lhs = [InterfaceSide::new(ElementType::Quad, 0, 3, 1)];
        let cfg = Config::default().with_constant("gamma", 1.4);

        let set = InterfaceSet::distributed(&mut be, &lhs, Rank::new(0), &map, &cfg).unwrap();
        assert_eq!(set.rhs_rank(), Some(Rank::new(0)));
        assert_eq!(set.rsolve_kernel(&be).unwrap().name(), "rsolve_rus_inv_mpi");
        assert_eq!(set.exchange_kernels(&be).unwrap().unwrap()[0].name(), "pack");
        assert_eq!(set.dims(), InterfaceDims { ndims: 2, nvars: 4 });
    }
}
