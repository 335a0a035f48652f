//! Backend-independent kernel descriptors.
//!
//! A [`Kernel`] is plain data: a name, the handles it reads or writes and
//! its scalar parameters. Building one has no side effects, so interface
//! sets can hand out the same descriptor as often as they are asked.

use super::{ConstId, MpiMatrixId, MpiViewId, ViewId};
use crate::comm::Tag;
use crate::types::Rank;

/// Operand of a compute kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    View(ViewId),
    MpiView(MpiViewId),
    Const(ConstId),
    MpiMatrix(MpiMatrixId),
}

/// A named, parameterised per-interface-point kernel.
///
/// # Example
///
/// ```ignore
/// let kern = ComputeKernel::new("rsolve_rus_inv_int", 2, 4)
///     .operand(Operand::View(lhs))
///     .operand(Operand::View(rhs))
///     .param("gamma", 1.4);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ComputeKernel {
    pub name: String,
    pub ndims: usize,
    pub nvars: usize,
    pub operands: Vec<Operand>,
    pub params: Vec<(&'static str, f64)>,
}

impl ComputeKernel {
    /// Start a descriptor with no operands or parameters.
    pub fn new(name: impl Into<String>, ndims: usize, nvars: usize) -> Self {
        Self {
            name: name.into(),
            ndims,
            nvars,
            operands: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append an operand.
    pub fn operand(mut self, operand: Operand) -> Self {
        self.operands.push(operand);
        self
    }

    /// Append a named scalar parameter.
    pub fn param(mut self, name: &'static str, value: f64) -> Self {
        self.params.push((name, value));
        self
    }

    /// Look up a parameter by name.
    pub fn get_param(&self, name: &str) -> Option<f64> {
        self.params.iter().find(|(n, _)| *n == name).map(|&(_, v)| v)
    }
}

/// A schedulable kernel.
///
/// The four exchange primitives are closed variants; everything the
/// equation adapters select is a [`ComputeKernel`].
#[derive(Clone, Debug, PartialEq)]
pub enum Kernel {
    /// Gather a distributed view into its send buffer.
    Pack { view: MpiViewId },
    /// Post a non-blocking send of a packed buffer.
    SendPack { view: MpiViewId, rank: Rank, tag: Tag },
    /// Post a non-blocking receive into a dense buffer.
    RecvPack { matrix: MpiMatrixId, rank: Rank, tag: Tag },
    /// Complete the receive; the dense buffer becomes a valid operand.
    Unpack { matrix: MpiMatrixId },
    /// Numerical-flux or common-value kernel.
    Compute(ComputeKernel),
}

impl Kernel {
    /// Kernel name as scheduled by the backend.
    pub fn name(&self) -> &str {
        match self {
            Kernel::Pack { .. } => "pack",
            Kernel::SendPack { .. } => "send_pack",
            Kernel::RecvPack { .. } => "recv_pack",
            Kernel::Unpack { .. } => "unpack",
            Kernel::Compute(k) => &k.name,
        }
    }

    /// The compute descriptor, if this is not an exchange primitive.
    pub fn as_compute(&self) -> Option<&ComputeKernel> {
        match self {
            Kernel::Compute(k) => Some(k),
            _ => None,
        }
    }
}

impl From<ComputeKernel> for Kernel {
    fn from(kernel: ComputeKernel) -> Self {
        Kernel::Compute(kernel)
    }
}
