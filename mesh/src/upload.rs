//! Hand-off of mesh contents to an external consumer (typically a GPU backend).
//!
//! The mesh never talks to a device itself. Instead it borrows its current
//! state into a [`MeshSnapshot`] and passes that to an [`UploadTarget`].

use crate::error::MeshResult;
use crate::index::IndexFormat;
use crate::layout::VertexLayout;
use crate::lod::LodTable;
use crate::math::Aabb;
use crate::submesh::SubMesh;

/// Borrowed view of everything a renderer needs to draw a mesh.
#[derive(Debug, Clone)]
pub struct MeshSnapshot<'a> {
    /// Debug label of the mesh.
    pub label: Option<&'a str>,
    /// Vertex layout.
    pub layout: &'a VertexLayout,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Vertex buffer generation at snapshot time.
    pub vertex_generation: u64,
    /// Raw bytes of each vertex stream.
    pub vertex_streams: Vec<&'a [u8]>,
    /// Index format.
    pub index_format: IndexFormat,
    /// Number of indices.
    pub index_count: u32,
    /// Index buffer generation at snapshot time.
    pub index_generation: u64,
    /// Raw index bytes in `index_format`.
    pub index_data: &'a [u8],
    /// Sub-mesh table.
    pub sub_meshes: &'a [SubMesh],
    /// LOD levels of every sub-mesh.
    pub lods: &'a LodTable,
    /// Mesh-wide bounds, if known.
    pub bounds: Option<Aabb>,
}

impl MeshSnapshot<'_> {
    /// Size in bytes of one vertex stream.
    pub fn vertex_buffer_size(&self, stream: usize) -> u64 {
        self.vertex_count as u64 * self.layout.stride_of(stream) as u64
    }

    /// Size in bytes of the index data.
    pub fn index_buffer_size(&self) -> u64 {
        self.index_count as u64 * self.index_format.size() as u64
    }

    /// Whether the mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }

    /// Number of vertex streams.
    pub fn stream_count(&self) -> usize {
        self.vertex_streams.len()
    }
}

/// Consumer of mesh snapshots.
///
/// Failures should be reported as [`MeshError::Upload`](crate::MeshError::Upload).
pub trait UploadTarget {
    /// Receive the current mesh contents.
    fn upload(&mut self, snapshot: &MeshSnapshot<'_>) -> MeshResult<()>;
}
