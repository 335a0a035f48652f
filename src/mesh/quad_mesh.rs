//! Uniform rectangular quadrilateral mesh with edge connectivity.
//!
//! Face convention (counter-clockwise around element):
//! - Face 0 (bottom): from vertex 0 to vertex 1
//! - Face 1 (right):  from vertex 1 to vertex 2
//! - Face 2 (top):    from vertex 2 to vertex 3
//! - Face 3 (left):   from vertex 3 to vertex 0
//!
//! Flux points on a face follow the face direction, so the two elements
//! sharing an edge see its points in opposite orders. Reading the left side
//! with rotation 0 and the right side with rotation 1 lines them up.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::InterfaceBackend;
use crate::elements::{ElementType, FaceShape, FluxPointElements, InterfaceSide};
use crate::error::{InterfaceError, Result};
use crate::types::{ElementIndex, FaceIndex, Rank, RotationTag};

/// Number of faces of a quadrilateral.
pub const NFACES: usize = 4;

/// Reference to an element and one of its faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementFace {
    /// Element index
    pub element: usize,
    /// Face index (0-3)
    pub face: usize,
}

impl ElementFace {
    pub fn new(element: usize, face: usize) -> Self {
        Self { element, face }
    }
}

/// An edge of the mesh.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Left element-face (always present)
    pub left: ElementFace,
    /// Right element-face (None for boundary edges)
    pub right: Option<ElementFace>,
}

impl Edge {
    /// Check if this is an interior edge.
    pub fn is_interior(&self) -> bool {
        self.right.is_some()
    }
}

/// The part of a partitioned mesh owned by one rank.
#[derive(Clone, Debug, Default)]
pub struct LocalPartition {
    /// Global ids of the local elements; local index `i` is `elements[i]`.
    pub elements: Vec<usize>,
    /// Left sides of edges with both elements local.
    pub internal_lhs: Vec<InterfaceSide>,
    /// Right sides of the same edges, in the same order.
    pub internal_rhs: Vec<InterfaceSide>,
    /// Local sides of edges shared with each neighbour rank, ordered by
    /// global edge index.
    pub remote: BTreeMap<Rank, Vec<InterfaceSide>>,
}

/// 2D mesh of quadrilateral elements on a structured grid.
#[derive(Clone, Debug)]
pub struct QuadMesh {
    /// Vertex coordinates: vertices[i] = (x, y)
    pub vertices: Vec<(f64, f64)>,
    /// Element-vertex connectivity, counter-clockwise from bottom-left
    pub elements: Vec<[usize; 4]>,
    /// Edge list, horizontal edges first then vertical
    pub edges: Vec<Edge>,
    /// element_edges[k][f] = edge index for face f of element k
    pub element_edges: Vec<[usize; NFACES]>,
    /// Elements in x-direction
    pub nx: usize,
    /// Elements in y-direction
    pub ny: usize,
}

impl QuadMesh {
    /// Create a uniform rectangular mesh of [x0, x1] × [y0, y1].
    pub fn uniform_rectangle(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        assert!(nx > 0 && ny > 0, "Need at least one element in each direction");
        assert!(x1 > x0 && y1 > y0, "Invalid domain bounds");

        let dx = (x1 - x0) / nx as f64;
        let dy = (y1 - y0) / ny as f64;

        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push((x0 + i as f64 * dx, y0 + j as f64 * dy));
            }
        }

        let mut elements = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let v0 = j * (nx + 1) + i;
                let v1 = v0 + 1;
                let v2 = v1 + (nx + 1);
                let v3 = v0 + (nx + 1);
                elements.push([v0, v1, v2, v3]);
            }
        }

        let (edges, element_edges) = Self::build_edges(nx, ny);
        Self {
            vertices,
            elements,
            edges,
            element_edges,
            nx,
            ny,
        }
    }

    fn build_edges(nx: usize, ny: usize) -> (Vec<Edge>, Vec<[usize; NFACES]>) {
        let elem_idx = |i: usize, j: usize| j * nx + i;
        let mut edges = Vec::with_capacity(nx * (ny + 1) + (nx + 1) * ny);
        let mut element_edges = vec![[0usize; NFACES]; nx * ny];

        // Horizontal edges: top face of the element below, bottom face of the one above
        for j in 0..=ny {
            for i in 0..nx {
                let below = (j > 0).then(|| ElementFace::new(elem_idx(i, j - 1), 2));
                let above = (j < ny).then(|| ElementFace::new(elem_idx(i, j), 0));
                Self::push_edge(&mut edges, &mut element_edges, below, above);
            }
        }

        // Vertical edges: right face of the element to the left, left face of the one to the right
        for j in 0..ny {
            for i in 0..=nx {
                let left = (i > 0).then(|| ElementFace::new(elem_idx(i - 1, j), 1));
                let right = (i < nx).then(|| ElementFace::new(elem_idx(i, j), 3));
                Self::push_edge(&mut edges, &mut element_edges, left, right);
            }
        }

        (edges, element_edges)
    }

    fn push_edge(
        edges: &mut Vec<Edge>,
        element_edges: &mut [[usize; NFACES]],
        a: Option<ElementFace>,
        b: Option<ElementFace>,
    ) {
        let idx = edges.len();
        for ef in [a, b].into_iter().flatten() {
            element_edges[ef.element][ef.face] = idx;
        }
        let (left, right) = match (a, b) {
            (Some(l), r) => (l, r),
            (None, Some(r)) => (r, None),
            (None, None) => return,
        };
        edges.push(Edge { left, right });
    }

    /// Number of elements.
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Number of interior edges.
    pub fn n_interior_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.is_interior()).count()
    }

    /// Start and end vertex of a face, in face direction.
    pub fn face_vertices(&self, element: usize, face: usize) -> ((f64, f64), (f64, f64)) {
        let v = self.elements[element];
        (self.vertices[v[face]], self.vertices[v[(face + 1) % NFACES]])
    }

    /// Position of the `j`-th of `npts` points on a face.
    pub fn face_point(&self, element: usize, face: usize, j: usize, npts: usize) -> (f64, f64) {
        let ((xa, ya), (xb, yb)) = self.face_vertices(element, face);
        let t = (j as f64 + 0.5) / npts as f64;
        (xa + t * (xb - xa), ya + t * (yb - ya))
    }

    /// Position of flux point `fpt` of an element with `npts` points per face.
    pub fn fpt_coord(&self, element: usize, fpt: usize, npts: usize) -> (f64, f64) {
        self.face_point(element, fpt / npts, fpt % npts, npts)
    }

    /// Outward unit normal and half-length of a face.
    pub fn face_normal(&self, element: usize, face: usize) -> ([f64; 2], f64) {
        let ((xa, ya), (xb, yb)) = self.face_vertices(element, face);
        let (tx, ty) = (xb - xa, yb - ya);
        let len = tx.hypot(ty);
        ([ty / len, -tx / len], 0.5 * len)
    }

    /// Both sides of every interior edge, over global element ids.
    pub fn interface_pairs(&self) -> (Vec<InterfaceSide>, Vec<InterfaceSide>) {
        self.edges
            .iter()
            .filter_map(|e| e.right.map(|r| (e.left, r)))
            .map(|(l, r)| (lhs_side(l.element, l.face), rhs_side(r.element, r.face)))
            .unzip()
    }

    /// Assign elements to `nparts` ranks in contiguous blocks of x-columns.
    pub fn partition_columns(&self, nparts: usize) -> Vec<Rank> {
        let nparts = nparts.clamp(1, self.nx);
        (0..self.n_elements())
            .map(|k| Rank::new((k % self.nx) * nparts / self.nx))
            .collect()
    }

    /// Local interface lists of rank `me` under the element ownership `ranks`.
    pub fn split(&self, ranks: &[Rank], me: Rank) -> Result<LocalPartition> {
        if ranks.len() != self.n_elements() {
            return Err(InterfaceError::shape_mismatch(
                format!("{} element ranks", self.n_elements()),
                ranks.len().to_string(),
            ));
        }

        let mut local = vec![None; self.n_elements()];
        let mut part = LocalPartition::default();
        for (k, _) in ranks.iter().enumerate().filter(|(_, r)| **r == me) {
            local[k] = Some(part.elements.len());
            part.elements.push(k);
        }

        for edge in &self.edges {
            let Some(right) = edge.right else { continue };
            let left = edge.left;
            match (local[left.element], local[right.element]) {
                (Some(l), Some(r)) => {
                    part.internal_lhs.push(lhs_side(l, left.face));
                    part.internal_rhs.push(rhs_side(r, right.face));
                }
                (Some(l), None) => part
                    .remote
                    .entry(ranks[right.element])
                    .or_default()
                    .push(lhs_side(l, left.face)),
                (None, Some(r)) => part
                    .remote
                    .entry(ranks[left.element])
                    .or_default()
                    .push(rhs_side(r, right.face)),
                (None, None) => {}
            }
        }

        debug!(
            rank = %me,
            elements = part.elements.len(),
            internal = part.internal_lhs.len(),
            neighbours = part.remote.len(),
            "split quad mesh"
        );
        Ok(part)
    }

    /// Flux-point store for the listed elements, in local order.
    ///
    /// Every face carries `npts` points. Normals are outward unit normals
    /// with magnitude equal to the face half-length.
    pub fn elements<B: InterfaceBackend>(
        &self,
        backend: &mut B,
        local: &[usize],
        npts: usize,
        nvars: usize,
        auxiliary: bool,
    ) -> Result<FluxPointElements> {
        let nfpts = NFACES * npts;
        let mut mag = Vec::with_capacity(local.len() * nfpts);
        let mut norm = Vec::with_capacity(local.len() * nfpts * 2);
        for &k in local {
            for face in 0..NFACES {
                let (n, m) = self.face_normal(k, face);
                for _ in 0..npts {
                    mag.push(m);
                    norm.extend_from_slice(&n);
                }
            }
        }

        let store = FluxPointElements::new(
            backend,
            ElementType::Quad,
            nvars,
            local.len(),
            &[(FaceShape::Line, npts); NFACES],
        )?;
        let store = if auxiliary {
            store.with_auxiliary(backend)?
        } else {
            store
        };
        store.with_normals(mag, norm)
    }
}

fn quad_side(eidx: usize, fidx: usize, rtag: RotationTag) -> InterfaceSide {
    InterfaceSide {
        etype: ElementType::Quad,
        eidx: ElementIndex::new(eidx),
        fidx: FaceIndex::new(fidx),
        rtag,
    }
}

/// Side of the edge's left element, read in stored order.
fn lhs_side(eidx: usize, fidx: usize) -> InterfaceSide {
    quad_side(eidx, fidx, RotationTag::IDENTITY)
}

/// Side of the edge's right element, read mirrored.
fn rhs_side(eidx: usize, fidx: usize) -> InterfaceSide {
    quad_side(eidx, fidx, RIGHT_SIDE_ROTATION)
}

/// Local element index of a global id within a partition.
pub fn local_index(part: &LocalPartition, global: usize) -> Option<ElementIndex> {
    part.elements.binary_search(&global).ok().map(ElementIndex::new)
}

/// Rotation tag used by the side owning an edge's right element.
pub const RIGHT_SIDE_ROTATION: RotationTag = RotationTag::MIRROR;
