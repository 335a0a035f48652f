//! Interfaces with both sides in the local partition.

use tracing::debug;

use super::assembly::{mag_pnorm_mat, norm_pnorm_mat, view_mats};
use super::base::InterfaceDims;
use crate::backend::{ConstArray, ConstId, InterfaceBackend, ViewFragments, ViewId};
use crate::config::InterfaceOptions;
use crate::elements::{ElementMap, InterfaceSide, ScalarState};
use crate::error::{InterfaceError, Result};

/// Operands shared by every internal interface set.
///
/// Index `i` of `lhs` and `rhs` is one physical interface seen from its two
/// sides. Only the lhs unit normal is kept; the rhs normal is its negation.
#[derive(Clone, Debug)]
pub struct InternalInterfaces {
    dims: InterfaceDims,
    npts: usize,
    lhs: ViewId,
    rhs: ViewId,
    mag_pnorm_lhs: ConstId,
    mag_pnorm_rhs: ConstId,
    norm_pnorm_lhs: ConstId,
}

impl InternalInterfaces {
    /// Build primary views and normals for matched side lists.
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        lhs: &[InterfaceSide],
        rhs: &[InterfaceSide],
        elemap: &ElementMap,
        opts: &InterfaceOptions,
    ) -> Result<Self> {
        if lhs.len() != rhs.len() {
            return Err(InterfaceError::shape_mismatch(
                format!("{} rhs sides", lhs.len()),
                rhs.len().to_string(),
            ));
        }
        let dims = InterfaceDims::from_elements(elemap)?;

        let (lhs_frags, rhs_frags) = view_pair(lhs, rhs, ScalarState::Primary, elemap)?;
        let npts = lhs_frags.npts();

        let mag_lhs = mag_pnorm_mat(lhs, elemap)?;
        let mag_rhs = mag_pnorm_mat(rhs, elemap)?;
        let norm_lhs = norm_pnorm_mat(lhs, elemap)?;
        if opts.check_normals {
            let norm_rhs = norm_pnorm_mat(rhs, elemap)?;
            check_opposed_normals(&norm_lhs, &norm_rhs, opts.normal_tolerance)?;
        }

        let set = Self {
            dims,
            npts,
            lhs: backend.view(lhs_frags, dims.nvars)?,
            rhs: backend.view(rhs_frags, dims.nvars)?,
            mag_pnorm_lhs: backend.const_matrix(mag_lhs)?,
            mag_pnorm_rhs: backend.const_matrix(mag_rhs)?,
            norm_pnorm_lhs: backend.const_matrix(norm_lhs)?,
        };

        debug!(
            interfaces = lhs.len(),
            npts,
            ndims = dims.ndims,
            nvars = dims.nvars,
            "built internal interfaces"
        );
        Ok(set)
    }

    pub fn dims(&self) -> InterfaceDims {
        self.dims
    }

    /// Interface points per side.
    pub fn npts(&self) -> usize {
        self.npts
    }

    pub fn lhs_view(&self) -> ViewId {
        self.lhs
    }

    pub fn rhs_view(&self) -> ViewId {
        self.rhs
    }

    pub fn mag_pnorm_lhs(&self) -> ConstId {
        self.mag_pnorm_lhs
    }

    pub fn mag_pnorm_rhs(&self) -> ConstId {
        self.mag_pnorm_rhs
    }

    pub fn norm_pnorm_lhs(&self) -> ConstId {
        self.norm_pnorm_lhs
    }
}

/// Assemble lhs and rhs views of `state`, requiring equal point counts.
pub(super) fn view_pair(
    lhs: &[InterfaceSide],
    rhs: &[InterfaceSide],
    state: ScalarState,
    elemap: &ElementMap,
) -> Result<(ViewFragments, ViewFragments)> {
    let lhs_frags = view_mats(lhs, state, elemap)?;
    let rhs_frags = view_mats(rhs, state, elemap)?;
    if lhs_frags.npts() != rhs_frags.npts() {
        return Err(InterfaceError::shape_mismatch(
            format!("{} rhs points", lhs_frags.npts()),
            rhs_frags.npts().to_string(),
        ));
    }
    Ok((lhs_frags, rhs_frags))
}

/// Require `n_lhs + n_rhs` to vanish at every point, in the max norm.
pub fn check_opposed_normals(lhs: &ConstArray, rhs: &ConstArray, tol: f64) -> Result<()> {
    if lhs.shape() != rhs.shape() {
        return Err(InterfaceError::shape_mismatch(
            format!("rhs normals of shape {:?}", lhs.shape()),
            format!("{:?}", rhs.shape()),
        ));
    }
    for point in 0..lhs.npts() {
        let deviation = lhs
            .point(point)
            .iter()
            .zip(rhs.point(point))
            .map(|(l, r)| (l + r).abs())
            .fold(0.0, |acc, d| if d > acc || d.is_nan() { d } else { acc });
        // NaN sticks and fails the comparison
        if !(deviation <= tol) {
            return Err(InterfaceError::InconsistentNormals { point, deviation });
        }
    }
    Ok(())
}
