//! Per-call update flags for mesh mutations.

use bitflags::bitflags;

bitflags! {
    /// Flags controlling optional work done by mutating [`Mesh`](crate::Mesh) calls.
    ///
    /// The default (empty) set performs full validation and never touches
    /// cached bounds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshUpdateFlags: u32 {
        /// Recompute mesh bounds and every sub-mesh bounds hint after the call.
        const RECALCULATE_BOUNDS = 1 << 0;
        /// Skip checking that sub-mesh indices (plus base vertex) reference
        /// existing vertices, and that sub-mesh index counts are whole
        /// primitives.
        const DONT_VALIDATE_SUB_MESH_VERTICES = 1 << 1;
    }
}
