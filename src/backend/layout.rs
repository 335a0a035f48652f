//! Flat operand layouts handed to the backend.
//!
//! Every array here is interface-point-major: position `i` in a view's
//! fragments and row `i` of a constant array describe the same physical
//! flux point. Kernels see each array as `[1, npts, width]`.

use super::MatrixId;

/// The three aligned fragments that define a view.
///
/// For point `i`:
/// - `mats[i]` is the storage matrix holding the point,
/// - `rcmap[2 * i]`, `rcmap[2 * i + 1]` are its (row, column),
/// - `stride[i]` is the column distance between consecutive variables.
///
/// Variable `k` of point `i` lives at `(row, column + k * stride)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewFragments {
    pub mats: Vec<MatrixId>,
    pub rcmap: Vec<usize>,
    pub stride: Vec<usize>,
}

impl ViewFragments {
    /// Width of the (row, column) fragment.
    pub const RCMAP_WIDTH: usize = 2;

    /// Empty fragments with room for `npts` points.
    pub fn with_capacity(npts: usize) -> Self {
        Self {
            mats: Vec::with_capacity(npts),
            rcmap: Vec::with_capacity(npts * Self::RCMAP_WIDTH),
            stride: Vec::with_capacity(npts),
        }
    }

    /// Append one point.
    #[inline]
    pub fn push(&mut self, mat: MatrixId, row: usize, col: usize, stride: usize) {
        self.mats.push(mat);
        self.rcmap.push(row);
        self.rcmap.push(col);
        self.stride.push(stride);
    }

    /// Number of points, taken from the location fragment.
    #[inline]
    pub fn npts(&self) -> usize {
        self.mats.len()
    }

    /// Check that the three fragments describe the same number of points.
    ///
    /// Returns the point count, or `(expected, actual)` describing the
    /// first disagreement.
    pub fn check_widths(&self) -> Result<usize, (String, String)> {
        let npts = self.npts();
        if self.rcmap.len() != Self::RCMAP_WIDTH * npts {
            return Err((
                format!("{} rcmap entries", Self::RCMAP_WIDTH * npts),
                format!("{}", self.rcmap.len()),
            ));
        }
        if self.stride.len() != npts {
            return Err((format!("{npts} stride entries"), format!("{}", self.stride.len())));
        }
        Ok(npts)
    }

    /// Concatenate `other` onto the end of `self`, preserving order.
    pub fn extend(&mut self, other: ViewFragments) {
        self.mats.extend(other.mats);
        self.rcmap.extend(other.rcmap);
        self.stride.extend(other.stride);
    }

    /// Kernel-facing shapes of the three fragments.
    pub fn shapes(&self) -> [[usize; 3]; 3] {
        let npts = self.npts();
        [[1, npts, 1], [1, npts, Self::RCMAP_WIDTH], [1, npts, 1]]
    }

    /// (row, column) of point `i`.
    #[inline]
    pub fn location(&self, i: usize) -> (usize, usize) {
        (self.rcmap[2 * i], self.rcmap[2 * i + 1])
    }
}

/// Immutable, contiguous per-point array such as normal magnitudes or
/// unit normals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstArray {
    data: Vec<f64>,
    width: usize,
}

impl ConstArray {
    /// Wrap row-major `data` with `width` values per point.
    ///
    /// Returns `None` if `data.len()` is not a multiple of `width`.
    pub fn new(data: Vec<f64>, width: usize) -> Option<Self> {
        if width == 0 || data.len() % width != 0 {
            return None;
        }
        Some(Self { data, width })
    }

    /// Number of points.
    pub fn npts(&self) -> usize {
        self.data.len() / self.width
    }

    /// Values per point.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Kernel-facing shape `[1, npts, width]`.
    pub fn shape(&self) -> [usize; 3] {
        [1, self.npts(), self.width]
    }

    /// Row-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Values of point `i`.
    pub fn point(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }
}
