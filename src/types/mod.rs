//! Strongly-typed index types shared across the interface layer.
//!
//! Element, face, rotation and rank indices are all plain `usize` values
//! at runtime; wrapping them keeps an interface side's four coordinates
//! from being swapped silently.
//!
//! # Example
//!
//! ```
//! use fr_rs::types::{ElementIndex, FaceIndex, Rank, RotationTag};
//!
//! let elem = ElementIndex::new(7);
//! let face = FaceIndex::new(2);
//! let rtag = RotationTag::new(1);
//! let rank = Rank::new(3);
//!
//! assert_eq!(elem.get(), 7);
//! assert_eq!(format!("{face}/{rtag}@{rank}"), "F2/R1@rank3");
//! ```

mod indices;

pub use indices::{ElementIndex, FaceIndex, Rank, RotationTag};
