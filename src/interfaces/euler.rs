//! Inviscid Euler interface sets.

use super::base::{InterfaceDims, RsolveKernel};
use super::distributed::DistributedInterfaces;
use super::internal::InternalInterfaces;
use crate::backend::{ComputeKernel, InterfaceBackend, Kernel, Operand};
use crate::config::{Config, RiemannSolver};
use crate::elements::{ElementMap, InterfaceSide};
use crate::error::Result;
use crate::types::Rank;

/// Physical constants of the convective flux, read once at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct ConvectiveParams {
    pub riemann_solver: RiemannSolver,
    pub gamma: f64,
    /// Viscosity, attached to the kernel when configured
    pub mu: Option<f64>,
}

impl ConvectiveParams {
    pub fn inviscid(cfg: &Config) -> Result<Self> {
        Ok(Self {
            riemann_solver: cfg.interfaces.riemann_solver,
            gamma: cfg.constant("gamma")?,
            mu: None,
        })
    }

    pub fn viscous(cfg: &Config) -> Result<Self> {
        Ok(Self {
            mu: cfg.constant_opt("mu"),
            ..Self::inviscid(cfg)?
        })
    }

    /// `rsolve_<rs>_inv_<suffix>` over `operands`.
    pub fn kernel(
        &self,
        suffix: &str,
        dims: InterfaceDims,
        operands: impl IntoIterator<Item = Operand>,
    ) -> ComputeKernel {
        let name = format!("rsolve_{}_inv_{suffix}", self.riemann_solver.short_name());
        let kern = operands
            .into_iter()
            .fold(ComputeKernel::new(name, dims.ndims, dims.nvars), ComputeKernel::operand)
            .param("gamma", self.gamma);
        match self.mu {
            Some(mu) => kern.param("mu", mu),
            None => kern,
        }
    }
}

/// Convective operands of an internal set, in kernel argument order.
pub(super) fn internal_operands(base: &InternalInterfaces) -> [Operand; 5] {
    [
        Operand::View(base.lhs_view()),
        Operand::View(base.rhs_view()),
        Operand::Const(base.mag_pnorm_lhs()),
        Operand::Const(base.mag_pnorm_rhs()),
        Operand::Const(base.norm_pnorm_lhs()),
    ]
}

/// Convective operands of a distributed set, in kernel argument order.
pub(super) fn distributed_operands(base: &DistributedInterfaces) -> [Operand; 4] {
    [
        Operand::MpiView(base.lhs_view()),
        Operand::MpiMatrix(base.rhs_matrix()),
        Operand::Const(base.mag_pnorm_lhs()),
        Operand::Const(base.norm_pnorm_lhs()),
    ]
}

/// Euler interfaces within one partition.
#[derive(Clone, Debug)]
pub struct EulerInternal {
    base: InternalInterfaces,
    params: ConvectiveParams,
}

impl EulerInternal {
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs: &[InterfaceSide],
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        let params = ConvectiveParams::inviscid(cfg)?;
        let base = InternalInterfaces::new(backend, lhs, rhs, elemap, &cfg.interfaces)?;
        Ok(Self { base, params })
    }

    pub fn base(&self) -> &InternalInterfaces {
        &self.base
    }

    pub fn gamma(&self) -> f64 {
        self.params.gamma
    }
}

impl RsolveKernel for EulerInternal {
    fn rsolve_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel> {
        let kern = self
            .params
            .kernel("int", self.base.dims(), internal_operands(&self.base));
        Ok(backend.kernel(kern.into())?)
    }
}

/// Euler interfaces shared with one remote rank.
#[derive(Clone, Debug)]
pub struct EulerDistributed {
    base: DistributedInterfaces,
    params: ConvectiveParams,
}

impl EulerDistributed {
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs_rank: Rank,
        elemap: &ElementMap,
        cfg: &Config,
    ) -> Result<Self> {
        let params = ConvectiveParams::inviscid(cfg)?;
        let base = DistributedInterfaces::new(backend, lhs, rhs_rank, elemap)?;
        Ok(Self { base, params })
    }

    pub fn base(&self) -> &DistributedInterfaces {
        &self.base
    }

    pub fn gamma(&self) -> f64 {
        self.params.gamma
    }
}

impl RsolveKernel for EulerDistributed {
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
    use crate::config::{ConfigError, InterfaceOptions};
    use crate::elements::{ElementType, FaceShape, FluxPointElements};
    use crate::error::InterfaceError;

    fn setup() -> (HostBackend, ElementMap, Vec<InterfaceSide>, Vec<InterfaceSide>) {
        let mut be = HostBackend::new();
        let quads = FluxPointElements::new(&mut be, ElementType::Quad, 4, 2, &[(FaceShape::Line, 2); 4]).unwrap();
        let lhs = vec![InterfaceSide::new(ElementType::Quad, 0, 1, 0)];
        let rhs = vec![InterfaceSide::new(ElementType::Quad, 1, 3, 1)];
        (be, ElementMap::new().with(quads), lhs, rhs)
    }

    #[test]
    fn test_rsolve_kernel_descriptor() {
        let (mut be, map, lhs, rhs) = setup();
        let cfg = Config::default().with_constant("gamma", 1.4);
        let set = EulerInternal::new(&mut be, &lhs, &rhs, &map, &cfg).unwrap();

        let kern = set.rsolve_kernel(&be).unwrap();
        let compute = kern.as_compute().unwrap();
        assert_eq!(compute.name, "rsolve_rus_inv_int");
        assert_eq!((compute.ndims, compute.nvars), (2, 4));
        assert_eq!(compute.operands.len(), 5);
        assert_eq!(compute.get_param("gamma"), Some(1.4));
        assert_eq!(compute.get_param("mu"), None);
    }

    #[test]
    fn test_rsolve_kernel_is_idempotent() {
        let (mut be, map, lhs, rhs) = setup();
        let cfg = Config::default().with_constant("gamma", 1.4);
        let set = EulerInternal::new(&mut be, &lhs, &rhs, &map, &cfg).unwrap();
        assert_eq!(set.rsolve_kernel(&be).unwrap(), set.rsolve_kernel(&be).unwrap());
    }

    #[test]
    fn test_configured_riemann_solver() {
        let (mut be, map, lhs, rhs) = setup();
        let cfg = Config::default()
            .with_constant("gamma", 1.4)
            .with_interfaces(InterfaceOptions::default().with_riemann_solver(RiemannSolver::Hll));
        let set = EulerInternal::new(&mut be, &lhs, &rhs, &map, &cfg).unwrap();
        assert_eq!(set.rsolve_kernel(&be).unwrap().name(), "rsolve_hll_inv_int");
    }

    #[test]
    fn test_missing_gamma() {
        let (mut be, map, lhs, rhs) = setup();
        let err = EulerInternal::new(&mut be, &lhs, &rhs, &map, &Config::default()).unwrap_err();
        assert!(matches!(err, InterfaceError::Config(ConfigError::MissingConstant(_))));
    }
}
