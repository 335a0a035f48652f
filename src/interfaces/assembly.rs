//! Flat operand assembly from per-side element data.
//!
//! Every function here walks the side list in order and concatenates what
//! the owning element type returns, so position `i` of each result refers
//! to the same interface point.

use tracing::debug;

use crate::backend::{ConstArray, ViewFragments};
use crate::elements::{ElementMap, InterfaceElements, InterfaceSide, ScalarState};
use crate::error::{InterfaceError, Result};

/// Concatenated view fragments of `state` for `sides`.
///
/// The result has `sum(npts per side)` points with shapes
/// `[1, npts, 1]`, `[1, npts, 2]` and `[1, npts, 1]`.
pub fn view_mats(
    sides: &[InterfaceSide],
    state: ScalarState,
    elemap: &ElementMap,
) -> Result<ViewFragments> {
    let mut out = ViewFragments::default();
    for side in sides {
        let frags = side_fragments(elemap.get(side.etype)?, side, state)?;
        out.extend(frags);
    }

    debug!(sides = sides.len(), npts = out.npts(), ?state, "assembled view");
    Ok(out)
}

/// Concatenated normal magnitudes for `sides`, shape `[1, npts, 1]`.
pub fn mag_pnorm_mat(sides: &[InterfaceSide], elemap: &ElementMap) -> Result<ConstArray> {
    let mut data = Vec::new();
    for side in sides {
        let elements = elemap.get(side.etype)?;
        let npts = side_npts(elements, side)?;
        let mag = elements.mag_pnorms_for_inter(side.eidx, side.fidx, side.rtag)?;
        if mag.len() != npts {
            return Err(InterfaceError::shape_mismatch(
                format!("{npts} normal magnitudes for {side}"),
                mag.len().to_string(),
            ));
        }
        data.extend(mag);
    }
    const_array(data, 1)
}

/// Concatenated unit normals for `sides`, shape `[1, npts, ndims]`.
pub fn norm_pnorm_mat(sides: &[InterfaceSide], elemap: &ElementMap) -> Result<ConstArray> {
    let mut data = Vec::new();
    let mut width = elemap.first().map_or(1, |e| e.ndims());
    for side in sides {
        let elements = elemap.get(side.etype)?;
        width = elements.ndims();
        let npts = side_npts(elements, side)?;
        let norm = elements.norm_pnorms_for_inter(side.eidx, side.fidx, side.rtag)?;
        if norm.len() != npts * width {
            return Err(InterfaceError::shape_mismatch(
                format!("{} unit normal components for {side}", npts * width),
                norm.len().to_string(),
            ));
        }
        data.extend(norm);
    }
    const_array(data, width)
}

fn side_fragments(
    elements: &dyn InterfaceElements,
    side: &InterfaceSide,
    state: ScalarState,
) -> Result<ViewFragments> {
    let frags = elements.scal_fpts_for_inter(state, side.eidx, side.fidx, side.rtag)?;
    frags
        .check_widths()
        .map_err(|(expected, actual)| InterfaceError::shape_mismatch(format!("{expected} for {side}"), actual))?;
    Ok(frags)
}

/// Point count of a side, as its primary view reports it.
fn side_npts(elements: &dyn InterfaceElements, side: &InterfaceSide) -> Result<usize> {
    Ok(side_fragments(elements, side, ScalarState::Primary)?.npts())
}

fn const_array(data: Vec<f64>, width: usize) -> Result<ConstArray> {
    let len = data.len();
    ConstArray::new(data, width).ok_or_else(|| {
        InterfaceError::shape_mismatch(format!("a multiple of {width} values"), len.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HostBackend, MatrixId};
    use crate::elements::{ElementType, FaceShape, FluxPointElements};
    use crate::types::{ElementIndex, FaceIndex, RotationTag};

    fn two_type_map(be: &mut HostBackend) -> ElementMap {
        let quads = FluxPointElements::new(be, ElementType::Quad, 4, 3, &[(FaceShape::Line, 4); 4]).unwrap();
        let tris = FluxPointElements::new(be, ElementType::Tri, 4, 2, &[(FaceShape::Line, 4); 3]).unwrap();
        ElementMap::new().with(quads).with(tris)
    }

    #[test]
    fn test_view_length_is_sum_of_side_points() {
        let mut be = HostBackend::new();
        let map = two_type_map(&mut be);
        let sides = [
            InterfaceSide::new(ElementType::Quad, 0, 1, 0),
            InterfaceSide::new(ElementType::Tri, 1, 2, 0),
            InterfaceSide::new(ElementType::Quad, 2, 3, 1),
        ];

        let frags = view_mats(&sides, ScalarState::Primary, &map).unwrap();
        assert_eq!(frags.npts(), 12);
        assert_eq!(frags.shapes(), [[1, 12, 1], [1, 12, 2], [1, 12, 1]]);
        // input order preserved: tri points sit in the middle block
        assert_eq!(frags.location(4).1, 1);
        assert_eq!(frags.stride[4], 2);
    }

    #[test]
    fn test_empty_side_list() {
        let mut be = HostBackend::new();
        let map = two_type_map(&mut be);
        assert_eq!(view_mats(&[], ScalarState::Primary, &map).unwrap().npts(), 0);
        assert_eq!(mag_pnorm_mat(&[], &map).unwrap().npts(), 0);
        assert_eq!(norm_pnorm_mat(&[], &map).unwrap().width(), 2);
    }

    #[test]
    fn test_missing_type_is_unsupported() {
        let mut be = HostBackend::new();
        let map = two_type_map(&mut be);
        let sides = [InterfaceSide::new(ElementType::Hex, 0, 0, 0)];
        let err = view_mats(&sides, ScalarState::Primary, &map).unwrap_err();
        assert!(matches!(err, InterfaceError::UnsupportedElementType { etype: ElementType::Hex, .. }));
    }

    #[test]
    fn test_normals_follow_view_order() {
        let mut be = HostBackend::new();
        let nfpts = 4;
        let mag: Vec<f64> = (0..nfpts).map(|p| p as f64).collect();
        let norm: Vec<f64> = (0..nfpts).flat_map(|p| [p as f64, -(p as f64)]).collect();
        let quads = FluxPointElements::new(&mut be, ElementType::Quad, 1, 1, &[(FaceShape::Line, 1); 4])
            .unwrap()
            .with_normals(mag, norm)
            .unwrap();
        let map = ElementMap::new().with(quads);
        let sides = [
            InterfaceSide::new(ElementType::Quad, 0, 3, 0),
            InterfaceSide::new(ElementType::Quad, 0, 1, 0),
        ];

        let mag = mag_pnorm_mat(&sides, &map).unwrap();
        assert_eq!(mag.as_slice(), &[3.0, 1.0]);
        let norm = norm_pnorm_mat(&sides, &map).unwrap();
        assert_eq!(norm.shape(), [1, 2, 2]);
        assert_eq!(norm.point(0), &[3.0, -3.0]);
    }

    /// Accessor whose fragments disagree in width.
    struct Broken;

    impl InterfaceElements for Broken {
        fn etype(&self) -> ElementType {
            ElementType::Pri
        }
        fn ndims(&self) -> usize {
            3
        }
        fn nvars(&self) -> usize {
            5
        }
        fn scal_fpts_for_inter(
            &self,
            _: ScalarState,
            _: ElementIndex,
            _: FaceIndex,
            _: RotationTag,
        ) -> Result<ViewFragments> {
            Ok(ViewFragments {
                mats: vec![MatrixId(0); 2],
                rcmap: vec![0; 3],
                stride: vec![1; 2],
            })
        }
        fn mag_pnorms_for_inter(&self, _: ElementIndex, _: FaceIndex, _: RotationTag) -> Result<Vec<f64>> {
            Ok(vec![1.0; 2])
        }
        fn norm_pnorms_for_inter(&self, _: ElementIndex, _: FaceIndex, _: RotationTag) -> Result<Vec<f64>> {
            Ok(vec![0.0; 6])
        }
    }

    #[test]
    fn test_fragment_width_mismatch() {
        let map = ElementMap::new().with(Broken);
        let sides = [InterfaceSide::new(ElementType::Pri, 0, 0, 0)];
        let err = view_mats(&sides, ScalarState::Primary, &map).unwrap_err();
        assert!(matches!(err, InterfaceError::ShapeMismatch { .. }));
    }
}
