//! Flux-point element store.
//!
//! Storage layout for one element type with `neles` elements, `nfpts` flux
//! points per element and `nvars` variables:
//!
//! ```text
//! matrix: nfpts x (nvars * neles)
//! value(element e, flux point p, variable k) = matrix[(p, k * neles + e)]
//! ```
//!
//! so a face point is addressed as `(row = p, col = e)` with a column
//! stride of `neles`. Flux points are numbered face by face; face `f`
//! occupies rows `offset[f]..offset[f] + npts[f]`.

use super::{ElementType, InterfaceElements, ScalarState};
use crate::backend::{HostBackend, InterfaceBackend, MatrixId, ViewFragments};
use crate::error::{InterfaceError, Result};
use crate::types::{ElementIndex, FaceIndex, RotationTag};

/// Shape of a face, which fixes how rotation tags reorder its points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceShape {
    /// Edge of a 2D element; points along the edge.
    Line,
    /// Triangular face; `m(m+1)/2` points on a triangular lattice.
    Tri,
    /// Quadrilateral face; `m*m` points on a tensor lattice.
    Quad,
}

impl FaceShape {
    /// Number of distinct rotation tags (tag 0 plus mirrored rotations).
    pub fn nrotations(self) -> usize {
        match self {
            FaceShape::Line => 2,
            FaceShape::Tri => 4,
            FaceShape::Quad => 5,
        }
    }

    /// Stored point index for each position of the face read under `rtag`.
    ///
    /// Tag 0 is the stored order. Tag `k >= 1` mirrors the face and then
    /// applies `k - 1` cyclic rotations.
    pub fn permutation(self, npts: usize, rtag: RotationTag) -> std::result::Result<Vec<usize>, String> {
        let r = rtag.get();
        if r >= self.nrotations() {
            return Err(format!("rotation tag < {} for {self:?} face, got {r}", self.nrotations()));
        }
        if r == 0 {
            return Ok((0..npts).collect());
        }
        let nrot = r - 1;

        match self {
            FaceShape::Line => Ok((0..npts).rev().collect()),
            FaceShape::Quad => {
                let m = exact_sqrt(npts).ok_or_else(|| format!("square point count, got {npts}"))?;
                let mut perm = Vec::with_capacity(npts);
                for j in 0..m {
                    for i in 0..m {
                        // mirror across the diagonal, then rotate a quarter turn nrot times
                        let (mut a, mut b) = (j, i);
                        for _ in 0..nrot {
                            (a, b) = (m - 1 - b, a);
                        }
                        perm.push(a + m * b);
                    }
                }
                Ok(perm)
            }
            FaceShape::Tri => {
                let m = triangular_side(npts)
                    .ok_or_else(|| format!("triangular point count, got {npts}"))?;
                let p = m - 1;
                let mut perm = Vec::with_capacity(npts);
                for j in 0..m {
                    for i in 0..m - j {
                        let (mut a, mut b) = (j, i);
                        for _ in 0..nrot {
                            let c = p - a - b;
                            (a, b) = (b, c);
                        }
                        perm.push(tri_index(p, a, b));
                    }
                }
                Ok(perm)
            }
        }
    }
}

fn exact_sqrt(n: usize) -> Option<usize> {
    let m = (n as f64).sqrt().round() as usize;
    (m * m == n).then_some(m)
}

fn triangular_side(n: usize) -> Option<usize> {
    let m = (((8 * n + 1) as f64).sqrt().round() as usize).saturating_sub(1) / 2;
    (m > 0 && m * (m + 1) / 2 == n).then_some(m)
}

/// Index of lattice point (i, j) with i + j <= p, rows of constant j stored in turn.
fn tri_index(p: usize, i: usize, j: usize) -> usize {
    j * (p + 1) - j * j.saturating_sub(1) / 2 + i
}

#[derive(Clone, Copy, Debug)]
struct FaceSpec {
    shape: FaceShape,
    npts: usize,
    offset: usize,
}

/// Flux-point storage and geometry for one element type.
///
/// # Example
///
/// ```
/// use fr_rs::backend::HostBackend;
/// use fr_rs::elements::{ElementType, FaceShape, FluxPointElements, InterfaceElements, ScalarState};
/// use fr_rs::types::{ElementIndex, FaceIndex, RotationTag};
///
/// let mut be = HostBackend::new();
/// let quads = FluxPointElements::new(
///     &mut be, ElementType::Quad, 4, 10, &[(FaceShape::Line, 3); 4],
/// ).unwrap();
///
/// let frags = quads
///     .scal_fpts_for_inter(ScalarState::Primary, ElementIndex::new(2), FaceIndex::new(1), RotationTag::MIRROR)
///     .unwrap();
/// assert_eq!(frags.npts(), 3);
/// assert_eq!(frags.location(0), (5, 2)); // last point of face 1, element 2
/// ```
#[derive(Clone, Debug)]
pub struct FluxPointElements {
    etype: ElementType,
    ndims: usize,
    nvars: usize,
    neles: usize,
    faces: Vec<FaceSpec>,
    nfpts: usize,
    primary: MatrixId,
    auxiliary: Option<MatrixId>,
    mag_pnorms: Vec<f64>,
    norm_pnorms: Vec<f64>,
}

impl FluxPointElements {
    /// Allocate primary storage for `neles` elements with the given faces.
    ///
    /// Normals start as magnitude 1 and zero direction; set them with
    /// [`with_normals`](Self::with_normals).
    pub fn new<B: InterfaceBackend>(
        backend: &mut B,
        etype: ElementType,
        nvars: usize,
        neles: usize,
        faces: &[(FaceShape, usize)],
    ) -> Result<Self> {
        let mut specs = Vec::with_capacity(faces.len());
        let mut offset = 0;
        for &(shape, npts) in faces {
            specs.push(FaceSpec {
                shape,
                npts,
                offset,
            });
            offset += npts;
        }
        let nfpts = offset;
        let ndims = etype.ndims();

        let primary = backend.matrix(nfpts, nvars * neles)?;
        Ok(Self {
            etype,
            ndims,
            nvars,
            neles,
            faces: specs,
            nfpts,
            primary,
            auxiliary: None,
            mag_pnorms: vec![1.0; neles * nfpts],
            norm_pnorms: vec![0.0; neles * nfpts * ndims],
        })
    }

    /// Allocate auxiliary storage with the primary layout.
    pub fn with_auxiliary<B: InterfaceBackend>(mut self, backend: &mut B) -> Result<Self> {
        self.auxiliary = Some(backend.matrix(self.nfpts, self.nvars * self.neles)?);
        Ok(self)
    }

    /// Set normals: `mag` is `neles x nfpts`, `norm` is `neles x nfpts x ndims`.
    pub fn with_normals(mut self, mag: Vec<f64>, norm: Vec<f64>) -> Result<Self> {
        let npts = self.neles * self.nfpts;
        if mag.len() != npts {
            return Err(InterfaceError::shape_mismatch(
                format!("{npts} normal magnitudes"),
                format!("{}", mag.len()),
            ));
        }
        if norm.len() != npts * self.ndims {
            return Err(InterfaceError::shape_mismatch(
                format!("{} unit normal components", npts * self.ndims),
                format!("{}", norm.len()),
            ));
        }
        self.mag_pnorms = mag;
        self.norm_pnorms = norm;
        Ok(self)
    }

    /// Number of elements.
    pub fn neles(&self) -> usize {
        self.neles
    }

    /// Flux points per element.
    pub fn nfpts(&self) -> usize {
        self.nfpts
    }

    /// Storage matrix of `state`, if allocated.
    pub fn state_matrix(&self, state: ScalarState) -> Option<MatrixId> {
        match state {
            ScalarState::Primary => Some(self.primary),
            ScalarState::Auxiliary => self.auxiliary,
        }
    }

    /// Write `f(element, flux point, variable)` into host storage of `state`.
    pub fn fill(
        &self,
        host: &mut HostBackend,
        state: ScalarState,
        f: impl Fn(ElementIndex, usize, usize) -> f64,
    ) -> Result<()> {
        let id = self
            .state_matrix(state)
            .ok_or_else(|| InterfaceError::unsupported(self.etype, state.accessor_name()))?;
        let mat = host.matrix_mut(id)?;
        for e in ElementIndex::iter(self.neles) {
            for p in 0..self.nfpts {
                for k in 0..self.nvars {
                    mat[(p, k * self.neles + e.get())] = f(e, p, k);
                }
            }
        }
        Ok(())
    }

    /// Stored flux-point rows of a face read under `rtag`.
    fn face_rows(&self, eidx: ElementIndex, fidx: FaceIndex, rtag: RotationTag) -> Result<Vec<usize>> {
        if eidx.get() >= self.neles {
            return Err(InterfaceError::shape_mismatch(
                format!("{} element index < {}", self.etype, self.neles),
                eidx.to_string(),
            ));
        }
        let face = self.faces.get(fidx.get()).ok_or_else(|| {
            InterfaceError::shape_mismatch(
                format!("{} face index < {}", self.etype, self.faces.len()),
                fidx.to_string(),
            )
        })?;

        let perm = face
            .shape
            .permutation(face.npts, rtag)
            .map_err(|reason| InterfaceError::shape_mismatch(reason, rtag.to_string()))?;
        Ok(perm.into_iter().map(|j| face.offset + j).collect())
    }
}

impl InterfaceElements for FluxPointElements {
    fn etype(&self) -> ElementType {
        self.etype
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    fn nvars(&self) -> usize {
        self.nvars
    }

    fn scal_fpts_for_inter(
        &self,
        state: ScalarState,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<ViewFragments> {
        let mat = self
            .state_matrix(state)
            .ok_or_else(|| InterfaceError::unsupported(self.etype, state.accessor_name()))?;
        let rows = self.face_rows(eidx, fidx, rtag)?;

        let mut frags = ViewFragments::with_capacity(rows.len());
        for row in rows {
            frags.push(mat, row, eidx.get(), self.neles);
        }
        Ok(frags)
    }

    fn mag_pnorms_for_inter(
        &self,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<Vec<f64>> {
        let base = eidx.get() * self.nfpts;
        Ok(self
            .face_rows(eidx, fidx, rtag)?
            .into_iter()
            .map(|row| self.mag_pnorms[base + row])
            .collect())
    }

    fn norm_pnorms_for_inter(
        &self,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<Vec<f64>> {
        let base = eidx.get() * self.nfpts;
        let nd = self.ndims;
        Ok(self
            .face_rows(eidx, fidx, rtag)?
            .into_iter()
            .flat_map(|row| {
                let start = (base + row) * nd;
                self.norm_pnorms[start..start + nd].iter().copied()
            })
            .collect())
    }
}
