//! Dimension bookkeeping and the kernel-selection contract.

use crate::backend::{InterfaceBackend, Kernel};
use crate::elements::ElementMap;
use crate::error::{InterfaceError, Result};

/// Spatial dimension and variable count shared by every element type of a
/// partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceDims {
    pub ndims: usize,
    pub nvars: usize,
}

impl InterfaceDims {
    /// Take the dimensions of the first element type in `elemap`.
    ///
    /// Element types are assumed to agree; the others are not checked.
    pub fn from_elements(elemap: &ElementMap) -> Result<Self> {
        let first = elemap.first().ok_or_else(|| {
            InterfaceError::shape_mismatch("at least one element type", "empty element map")
        })?;
        Ok(Self {
            ndims: first.ndims(),
            nvars: first.nvars(),
        })
    }
}

/// Selects the numerical-flux kernel of an interface set.
///
/// Selection is pure: it only describes the kernel, so repeated calls
/// return equal descriptors.
pub trait RsolveKernel {
    /// Describe the Riemann solve over this set's operands.
    fn rsolve_kernel(&self, backend: &impl InterfaceBackend) -> Result<Kernel>;
}
