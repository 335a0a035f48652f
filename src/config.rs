//! Run configuration consumed by the equation adapters.
//!
//! Physical constants are named values read once when an interface set is
//! built. Everything else has a default, so the minimal Euler configuration
//! is a single `gamma`:
//!
//! ```
//! use fr_rs::config::{Config, EquationSystem, RiemannSolver};
//!
//! let cfg = Config::from_toml_str(r#"
//!     [constants]
//!     gamma = 1.4
//!
//!     [solver]
//!     system = "navier-stokes"
//!
//!     [solver-interfaces]
//!     riemann-solver = "hll"
//!     ldg-beta = 0.25
//! "#).unwrap();
//!
//! assert_eq!(cfg.constant("gamma").unwrap(), 1.4);
//! assert_eq!(cfg.solver.system, EquationSystem::NavierStokes);
//! assert_eq!(cfg.interfaces.riemann_solver, RiemannSolver::Hll);
//! assert!(cfg.interfaces.check_normals);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required physical constant is absent from `[constants]`.
    #[error("Missing constant `{0}` in [constants]")]
    MissingConstant(String),

    /// A value is present but unusable.
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The document is not valid TOML for this schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Which equation system the interface sets discretise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquationSystem {
    /// Inviscid Euler equations
    #[default]
    Euler,
    /// Compressible Navier-Stokes equations
    NavierStokes,
}

impl EquationSystem {
    /// Whether the system carries auxiliary (viscous) interface state.
    pub fn is_viscous(self) -> bool {
        matches!(self, EquationSystem::NavierStokes)
    }
}

/// Approximate Riemann solver used for the interface flux.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiemannSolver {
    /// Rusanov / local Lax-Friedrichs
    #[default]
    Rusanov,
    /// Roe linearised solver
    Roe,
    /// Harten-Lax-van Leer two-wave solver
    Hll,
}

impl RiemannSolver {
    /// Short name used in kernel names (`rsolve_<short>_inv_int`).
    pub fn short_name(self) -> &'static str {
        match self {
            RiemannSolver::Rusanov => "rus",
            RiemannSolver::Roe => "roe",
            RiemannSolver::Hll => "hll",
        }
    }
}

/// `[solver]` section.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SolverSection {
    pub system: EquationSystem,
}

/// `[solver-interfaces]` section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InterfaceOptions {
    /// Interface Riemann solver.
    pub riemann_solver: RiemannSolver,
    /// LDG upwinding constant for the common solution value.
    pub ldg_beta: f64,
    /// Verify that rhs normals are the negated lhs normals at setup.
    pub check_normals: bool,
    /// Max-norm tolerance for the normal check.
    pub normal_tolerance: f64,
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            riemann_solver: RiemannSolver::Rusanov,
            ldg_beta: 0.5,
            check_normals: true,
            normal_tolerance: 1e-10,
        }
    }
}

impl InterfaceOptions {
    /// Select the Riemann solver.
    pub fn with_riemann_solver(mut self, rs: RiemannSolver) -> Self {
        self.riemann_solver = rs;
        self
    }

    /// Set the LDG beta constant.
    pub fn with_ldg_beta(mut self, beta: f64) -> Self {
        self.ldg_beta = beta;
        self
    }

    /// Enable or disable the normal antisymmetry check.
    pub fn with_check_normals(mut self, check: bool) -> Self {
        self.check_normals = check;
        self
    }

    /// Set the normal check tolerance.
    pub fn with_normal_tolerance(mut self, tol: f64) -> Self {
        self.normal_tolerance = tol;
        self
    }
}

/// Complete run configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named physical constants (`gamma`, `mu`, ...).
    pub constants: BTreeMap<String, f64>,
    pub solver: SolverSection,
    #[serde(rename = "solver-interfaces")]
    pub interfaces: InterfaceOptions,
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set a named constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Select the equation system.
    pub fn with_system(mut self, system: EquationSystem) -> Self {
        self.solver.system = system;
        self
    }

    /// Replace the interface options.
    pub fn with_interfaces(mut self, options: InterfaceOptions) -> Self {
        self.interfaces = options;
        self
    }

    /// A required named constant.
    pub fn constant(&self, name: &str) -> Result<f64, ConfigError> {
        self.constants
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::MissingConstant(name.to_string()))
    }

    /// An optional named constant.
    pub fn constant_opt(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    /// Reject values no interface set can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((name, _)) = self.constants.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::InvalidValue {
                key: format!("constants.{name}"),
                reason: "must be finite".into(),
            });
        }
        let opts = &self.interfaces;
        if !opts.ldg_beta.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "solver-interfaces.ldg-beta".into(),
                reason: "must be finite".into(),
            });
        }
        if !(opts.normal_tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "solver-interfaces.normal-tolerance".into(),
                reason: "must be non-negative".into(),
            });
        }
        Ok(())
    }
}
