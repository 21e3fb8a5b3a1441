//! # RedLilium Mesh
//!
//! CPU-side mesh geometry buffers for RedLilium Engine.
//!
//! A [`Mesh`] owns a typed, multi-stream [`VertexBuffer`], an [`IndexBuffer`],
//! a [`SubMeshTable`] partitioning the indices, per-sub-mesh [`LodLevel`]s,
//! optional [`SkinningData`] and blend shapes. Every mutation is validated up
//! front and either applies completely or fails with a [`MeshError`] leaving
//! the mesh untouched.
//!
//! GPU upload is not performed here: a renderer implements [`UploadTarget`]
//! and receives a borrowed [`MeshSnapshot`].

pub mod blend_shape;
pub mod error;
pub mod flags;
pub mod generators;
pub mod index;
pub mod layout;
pub mod lod;
pub mod math;
pub mod mesh;
pub mod skinning;
pub mod submesh;
pub mod upload;
pub mod value;
pub mod vertex;

pub use blend_shape::{BlendShape, BlendShapeFrame, BlendShapeSet};
pub use error::{MeshError, MeshResult};
pub use flags::MeshUpdateFlags;
pub use index::{IndexBuffer, IndexFormat, IndexView};
pub use layout::{
    ComponentClass, VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout,
};
pub use lod::{LodLevel, LodSelectionCurve, LodTable, MetricProvider};
pub use math::Aabb;
pub use mesh::{Mesh, MeshDescriptor};
pub use skinning::{BoneWeight, SkinningData};
pub use submesh::{OverlapPolicy, PrimitiveTopology, SubMesh, SubMeshTable};
pub use upload::{MeshSnapshot, UploadTarget};
pub use value::VertexValue;
pub use vertex::{AttributeSlice, AttributeView, VertexBuffer};

/// Mesh library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("RedLilium Mesh v{} initialized", VERSION);
}
