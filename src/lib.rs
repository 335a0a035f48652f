//! # fr-rs
//!
//! The interface layer of a high-order flux-reconstruction solver.
//!
//! This crate connects element-local flux-point storage across faces:
//! - Flat, orientation-aware views over scattered element face data
//! - Normal magnitude and unit-normal arrays in matching order
//! - Internal interfaces (both sides local) and distributed interfaces
//!   (right side on another rank) with a pack/send/recv/unpack exchange
//! - Riemann-solver and common-solution kernel descriptors for the Euler
//!   and Navier-Stokes equations
//!
//! Reference collaborators make the layer runnable on its own: a CPU
//! backend, an in-process transport, a flux-point element store and a
//! structured quadrilateral mesh.
//!
//! ```
//! use fr_rs::prelude::*;
//!
//! let mesh = QuadMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 2, 2);
//! let mut be = HostBackend::new();
//! let all: Vec<usize> = (0..mesh.n_elements()).collect();
//! let quads = mesh.elements(&mut be, &all, 3, 4, false).unwrap();
//! let elemap = ElementMap::new().with(quads);
//!
//! let (lhs, rhs) = mesh.interface_pairs();
//! let cfg = Config::default().with_constant("gamma", 1.4);
//! let set = InterfaceSet::internal(&mut be, &lhs, &rhs, &elemap, &cfg).unwrap();
//!
//! assert_eq!(set.npts(), 4 * 3);
//! assert_eq!(set.rsolve_kernel(&be).unwrap().name(), "rsolve_rus_inv_int");
//! ```

pub mod backend;
pub mod comm;
pub mod config;
pub mod elements;
pub mod error;
pub mod interfaces;
pub mod mesh;
pub mod types;

pub use backend::{HostBackend, InterfaceBackend, Kernel};
pub use comm::{CommError, LocalWorld, Tag, Transport};
pub use config::{Config, EquationSystem, InterfaceOptions, RiemannSolver};
pub use elements::{ElementMap, ElementType, InterfaceElements, InterfaceSide, ScalarState};
pub use error::{InterfaceError, Result};
pub use interfaces::{EXCHANGE_TAG, InterfaceSet, RsolveKernel};
pub use mesh::QuadMesh;
pub use types::{ElementIndex, FaceIndex, Rank, RotationTag};

/// Common imports for building and driving interface sets.
pub mod prelude {
    pub use crate::backend::{HostBackend, InterfaceBackend, Kernel};
    pub use crate::comm::{LocalWorld, Transport};
    pub use crate::config::{Config, EquationSystem, InterfaceOptions};
    pub use crate::elements::{
        ElementMap, ElementType, FaceShape, FluxPointElements, InterfaceElements, InterfaceSide,
        ScalarState,
    };
    pub use crate::error::{InterfaceError, Result};
    pub use crate::interfaces::{InterfaceSet, RsolveKernel};
    pub use crate::mesh::QuadMesh;
    pub use crate::types::{ElementIndex, FaceIndex, Rank, RotationTag};
}
