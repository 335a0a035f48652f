//! Opaque handles to backend allocations.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the allocation within its backend.
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

define_handle!(
    /// Element storage matrix (per element type, per state).
    MatrixId
);

define_handle!(
    /// Indirect view into element storage.
    ViewId
);

define_handle!(
    /// Indirect view that also owns a packed send buffer.
    MpiViewId
);

define_handle!(
    /// Immutable dense per-point array.
    ConstId
);

define_handle!(
    /// Dense receive buffer shaped like an [`MpiViewId`] view.
    MpiMatrixId
);
