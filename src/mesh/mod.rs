//! Reference mesh and partitioning.
//!
//! A structured quadrilateral mesh that enumerates interior interfaces and
//! splits them across ranks by x-column blocks. It exists to drive the
//! interface layer end to end; general mesh decomposition lives elsewhere.

mod quad_mesh;

pub use quad_mesh::{
    Edge, ElementFace, LocalPartition, NFACES, QuadMesh, RIGHT_SIDE_ROTATION, local_index,
};
