//! Mesh error types.

use thiserror::Error;

use crate::layout::VertexAttributeSemantic;

/// Errors returned by mesh buffer operations.
///
/// All variants describe a broken caller contract. None of them are transient,
/// so retrying the same call with the same arguments fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// The attribute descriptors do not form a valid layout.
    #[error("invalid vertex layout: {0}")]
    InvalidLayout(String),
    /// An argument is malformed (bad count, unknown stream, foreign view).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A write or read range runs past the end of a buffer.
    #[error("range {start}..{start}+{count} out of bounds (length {len})")]
    RangeOutOfBounds {
        /// First element of the requested range.
        start: u64,
        /// Number of elements requested.
        count: u64,
        /// Current length of the buffer.
        len: u64,
    },
    /// The layout has no attribute with this semantic.
    #[error("vertex attribute {0:?} is not present in the layout")]
    AttributeNotPresent(VertexAttributeSemantic),
    /// The value type does not match the declared attribute format.
    #[error("format mismatch for {semantic:?}: declared {declared}, got {provided}")]
    FormatMismatch {
        /// Attribute being accessed.
        semantic: VertexAttributeSemantic,
        /// Declared format and dimension, e.g. `Float32x3`.
        declared: String,
        /// Shape of the value type that was supplied.
        provided: String,
    },
    /// An index (element position or stored vertex index) is past its limit.
    #[error("{what} {index} out of range (limit {limit})")]
    IndexOutOfRange {
        /// What kind of index overflowed.
        what: &'static str,
        /// The offending index.
        index: u64,
        /// Exclusive upper bound.
        limit: u64,
    },
    /// A vertex index does not fit the 16-bit index format.
    #[error("index value {0} does not fit in a 16-bit index buffer")]
    IndexOverflow(u32),
    /// A sub-mesh or LOD range is not contained in its parent range.
    #[error("invalid range: {0}")]
    InvalidRange(String),
    /// A per-vertex array length disagrees with the vertex count.
    #[error("{what}: expected {expected} elements, got {actual}")]
    CountMismatch {
        /// Which array had the wrong length.
        what: &'static str,
        /// Required length.
        expected: u64,
        /// Supplied length.
        actual: u64,
    },
    /// The bone weight array length disagrees with the sum of bones per vertex.
    #[error("bone weight count mismatch: bones per vertex sum to {expected}, got {actual} weights")]
    WeightCountMismatch {
        /// Sum of the bones-per-vertex array.
        expected: u64,
        /// Number of weights supplied.
        actual: u64,
    },
    /// A view was used after its buffer was mutated.
    #[error("stale view: created at generation {view}, buffer is at generation {current}")]
    StaleView {
        /// Generation the view was created at.
        view: u64,
        /// Current buffer generation.
        current: u64,
    },
    /// The upload collaborator rejected a snapshot.
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Convenience alias used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;

/// Check that `start..start+count` lies within `len` elements.
pub(crate) fn check_range(start: u32, count: u32, len: u32) -> MeshResult<()> {
    if start as u64 + count as u64 > len as u64 {
        return Err(MeshError::RangeOutOfBounds {
            start: start as u64,
            count: count as u64,
            len: len as u64,
        });
    }
    Ok(())
}
