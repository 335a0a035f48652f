//! Element-type accessors for interface data.
//!
//! Each element type in a partition owns its flux-point storage. The
//! interface layer never sees that storage directly: it asks the element
//! type, through [`InterfaceElements`], for view fragments and normals of
//! one face seen under one rotation, and concatenates the answers.
//!
//! Element types form a closed set ([`ElementType`]); an [`ElementMap`]
//! maps each tag to its accessor with a plain array lookup resolved once at
//! setup.

mod flux_points;

use std::fmt;

pub use flux_points::{FaceShape, FluxPointElements};

use crate::backend::ViewFragments;
use crate::error::{InterfaceError, Result};
use crate::types::{ElementIndex, FaceIndex, RotationTag};

/// Closed set of supported element shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Tri,
    Quad,
    Tet,
    Pri,
    Pyr,
    Hex,
}

impl ElementType {
    /// Number of element types.
    pub const COUNT: usize = 6;

    /// Slot of this type in an [`ElementMap`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case name as used in mesh files.
    pub fn name(self) -> &'static str {
        match self {
            ElementType::Tri => "tri",
            ElementType::Quad => "quad",
            ElementType::Tet => "tet",
            ElementType::Pri => "pri",
            ElementType::Pyr => "pyr",
            ElementType::Hex => "hex",
        }
    }

    /// Spatial dimension of the shape.
    pub fn ndims(self) -> usize {
        match self {
            ElementType::Tri | ElementType::Quad => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which per-element scalar state a view addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarState {
    /// Solution at the flux points
    Primary,
    /// Second scalar field (common solution for viscous systems)
    Auxiliary,
}

impl ScalarState {
    /// Accessor name reported when an element type lacks this state.
    pub fn accessor_name(self) -> &'static str {
        match self {
            ScalarState::Primary => "scal_fpts_primary",
            ScalarState::Auxiliary => "scal_fpts_auxiliary",
        }
    }
}

/// One side of an interface: a face of a local element, read under a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceSide {
    pub etype: ElementType,
    pub eidx: ElementIndex,
    pub fidx: FaceIndex,
    pub rtag: RotationTag,
}

impl InterfaceSide {
    /// Create a side from raw indices.
    pub fn new(etype: ElementType, eidx: usize, fidx: usize, rtag: usize) -> Self {
        Self {
            etype,
            eidx: ElementIndex::new(eidx),
            fidx: FaceIndex::new(fidx),
            rtag: RotationTag::new(rtag),
        }
    }
}

impl fmt::Display for InterfaceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}/{}", self.etype, self.eidx, self.fidx, self.rtag)
    }
}

/// Interface data accessors provided by an element type.
///
/// For a given (element, face, rotation) all three methods must describe
/// the face's points in the same order. That shared order is what lets the
/// interface layer line up views and normals built separately.
pub trait InterfaceElements: Send + Sync {
    /// Element type served by this accessor.
    fn etype(&self) -> ElementType;

    /// Spatial dimension.
    fn ndims(&self) -> usize;

    /// Number of solution variables.
    fn nvars(&self) -> usize;

    /// View fragments for the face's points of `state`.
    fn scal_fpts_for_inter(
        &self,
        state: ScalarState,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<ViewFragments>;

    /// Physical normal magnitude at each face point.
    fn mag_pnorms_for_inter(
        &self,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<Vec<f64>>;

    /// Outward unit normal at each face point, `ndims` values per point.
    fn norm_pnorms_for_inter(
        &self,
        eidx: ElementIndex,
        fidx: FaceIndex,
        rtag: RotationTag,
    ) -> Result<Vec<f64>>;
}

/// Mapping from element type to its accessor.
pub struct ElementMap {
    slots: [Option<Box<dyn InterfaceElements>>; ElementType::COUNT],
}

impl Default for ElementMap {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl ElementMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an accessor, replacing any previous one for its type.
    pub fn insert(&mut self, elements: impl InterfaceElements + 'static) -> &mut Self {
        let slot = elements.etype().index();
        self.slots[slot] = Some(Box::new(elements));
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, elements: impl InterfaceElements + 'static) -> Self {
        self.insert(elements);
        self
    }

    /// Accessor for `etype`.
    pub fn get(&self, etype: ElementType) -> Result<&dyn InterfaceElements> {
        self.slots[etype.index()]
            .as_deref()
            .ok_or_else(|| InterfaceError::unsupported(etype, "interface data"))
    }

    /// First accessor in tag order.
    pub fn first(&self) -> Option<&dyn InterfaceElements> {
        self.iter().next()
    }

    /// All accessors in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn InterfaceElements> {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }

    /// Number of element types present.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no element type is present.
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

impl fmt::Debug for ElementMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|e| e.etype()))
            .finish()
    }
}
