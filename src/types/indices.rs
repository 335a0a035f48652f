//! Index newtypes for interface sides and partitions.

use std::fmt;

/// Generates a `usize` newtype with conversions, display and slice indexing.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// Iterate over `[0, n)`.
            pub fn iter(n: usize) -> impl ExactSizeIterator<Item = Self> {
                (0..n).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }
    };
}

define_index!(
    /// Index of an element within its element type.
    ///
    /// Element indices are local to one partition and one element type:
    /// `ElementIndex::new(3)` on a quad store and on a tri store are
    /// different elements.
    ///
    /// ```
    /// use fr_rs::types::ElementIndex;
    ///
    /// let elem = ElementIndex::new(42);
    /// assert_eq!(elem.get(), 42);
    /// ```
    ElementIndex,
    "E"
);

define_index!(
    /// Local face index within an element (0..nfaces for its type).
    FaceIndex,
    "F"
);

define_index!(
    /// Relative orientation of a face as seen from one side of an interface.
    ///
    /// Tag 0 reads the face points in stored order. Tag k >= 1 mirrors the
    /// face and then applies k-1 cyclic rotations.
    RotationTag,
    "R"
);

define_index!(
    /// Rank of a partition in a distributed run.
    Rank,
    "rank"
);

impl RotationTag {
    /// Stored order, no reordering.
    pub const IDENTITY: Self = Self(0);

    /// Plain mirror, the orientation of the opposite side of a line face.
    pub const MIRROR: Self = Self(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(ElementIndex::new(4).to_string(), "E4");
        assert_eq!(FaceIndex::new(1).to_string(), "F1");
        assert_eq!(RotationTag::MIRROR.to_string(), "R1");
        assert_eq!(Rank::new(2).to_string(), "rank2");
    }

    #[test]
    fn test_slice_indexing() {
        let data = vec![10.0, 20.0, 30.0];
        assert_eq!(data[ElementIndex::new(1)], 20.0);
        assert_eq!(data.as_slice()[ElementIndex::new(2)], 30.0);
    }

    #[test]
    fn test_iter() {
        let ranks: Vec<_> = Rank::iter(3).collect();
        assert_eq!(ranks, vec![Rank::new(0), Rank::new(1), Rank::new(2)]);
    }
}
