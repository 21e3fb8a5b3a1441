//! Vertex layout definitions.
//!
//! A [`VertexLayout`] describes which attributes a mesh stores, how each one
//! is encoded, and where it lives:
//!
//! - **Semantic**: what the attribute means (position, normal, UV set, ...).
//!   A layout holds at most one attribute per semantic.
//! - **Format and dimension**: the component encoding (`Float32`, `Unorm8`, ...)
//!   and the number of components (1 to 4).
//! - **Stream and offset**: vertex data is split into one or more interleaved
//!   streams. Stream indices are contiguous from 0, and the attributes of a
//!   stream tile it without overlap. The stride of a stream is the sum of its
//!   attribute sizes.
//!
//! Layouts are only obtainable through [`VertexLayout::define`] (or the
//! presets), so every `VertexLayout` value is valid. They are shared via `Arc`
//! since there are typically only a few layouts across many meshes.
//!
//! # Example
//!
//! ```
//! use redlilium_mesh::{VertexAttribute, VertexLayout};
//!
//! // Stream 0: static UVs, stream 1: dynamic position + normal.
//! let layout = VertexLayout::define([
//!     VertexAttribute::texcoord0(0).at_stream(0),
//!     VertexAttribute::position(0).at_stream(1),
//!     VertexAttribute::normal(12).at_stream(1),
//! ])
//! .unwrap();
//!
//! assert_eq!(layout.stream_count(), 2);
//! assert_eq!(layout.stride_of(0), 8);
//! assert_eq!(layout.stride_of(1), 24);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{MeshError, MeshResult};

/// Semantic meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VertexAttributeSemantic {
    /// Vertex position (typically float3).
    Position,
    /// Vertex normal (typically float3).
    Normal,
    /// Vertex tangent (typically float4, w = handedness).
    Tangent,
    /// Vertex color (typically float4 or unorm8x4).
    Color,
    /// Texture coordinates set 0.
    TexCoord0,
    /// Texture coordinates set 1.
    TexCoord1,
    /// Texture coordinates set 2.
    TexCoord2,
    /// Texture coordinates set 3.
    TexCoord3,
    /// Texture coordinates set 4.
    TexCoord4,
    /// Texture coordinates set 5.
    TexCoord5,
    /// Texture coordinates set 6.
    TexCoord6,
    /// Texture coordinates set 7.
    TexCoord7,
    /// Bone weights for skinning.
    Weights,
    /// Bone indices for skinning.
    Joints,
}

impl VertexAttributeSemantic {
    /// All semantics in canonical order.
    pub const ALL: [VertexAttributeSemantic; 14] = [
        Self::Position,
        Self::Normal,
        Self::Tangent,
        Self::Color,
        Self::TexCoord0,
        Self::TexCoord1,
        Self::TexCoord2,
        Self::TexCoord3,
        Self::TexCoord4,
        Self::TexCoord5,
        Self::TexCoord6,
        Self::TexCoord7,
        Self::Weights,
        Self::Joints,
    ];

    /// Get a unique index for this semantic (used for matching).
    pub fn index(&self) -> u32 {
        *self as u32
    }

    /// Texture coordinate semantic for UV set `set` (0..=7).
    pub fn texcoord(set: u32) -> Option<Self> {
        match set {
            0 => Some(Self::TexCoord0),
            1 => Some(Self::TexCoord1),
            2 => Some(Self::TexCoord2),
            3 => Some(Self::TexCoord3),
            4 => Some(Self::TexCoord4),
            5 => Some(Self::TexCoord5),
            6 => Some(Self::TexCoord6),
            7 => Some(Self::TexCoord7),
            _ => None,
        }
    }
}

/// Broad class of a component: what logical values it can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    /// Floating point (including normalized integer encodings).
    Float,
    /// Unsigned integer.
    Uint,
    /// Signed integer.
    Sint,
}

/// Encoding of a single attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// 32-bit float.
    Float32,
    /// 16-bit IEEE half float.
    Float16,
    /// 8-bit unsigned, normalized to 0.0..=1.0.
    Unorm8,
    /// 8-bit signed, normalized to -1.0..=1.0.
    Snorm8,
    /// 16-bit unsigned, normalized to 0.0..=1.0.
    Unorm16,
    /// 16-bit signed, normalized to -1.0..=1.0.
    Snorm16,
    /// 8-bit unsigned integer.
    Uint8,
    /// 8-bit signed integer.
    Sint8,
    /// 16-bit unsigned integer.
    Uint16,
    /// 16-bit signed integer.
    Sint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// 32-bit signed integer.
    Sint32,
}

impl VertexAttributeFormat {
    /// Size in bytes of one component.
    pub fn size(&self) -> usize {
        match self {
            Self::Unorm8 | Self::Snorm8 | Self::Uint8 | Self::Sint8 => 1,
            Self::Float16 | Self::Unorm16 | Self::Snorm16 | Self::Uint16 | Self::Sint16 => 2,
            Self::Float32 | Self::Uint32 | Self::Sint32 => 4,
        }
    }

    /// Which logical value class this format stores.
    pub fn class(&self) -> ComponentClass {
        match self {
            Self::Float32
            | Self::Float16
            | Self::Unorm8
            | Self::Snorm8
            | Self::Unorm16
            | Self::Snorm16 => ComponentClass::Float,
            Self::Uint8 | Self::Uint16 | Self::Uint32 => ComponentClass::Uint,
            Self::Sint8 | Self::Sint16 | Self::Sint32 => ComponentClass::Sint,
        }
    }

    /// Whether the format stores a normalized integer.
    pub fn is_normalized(&self) -> bool {
        matches!(
            self,
            Self::Unorm8 | Self::Snorm8 | Self::Unorm16 | Self::Snorm16
        )
    }
}

impl fmt::Display for VertexAttributeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single vertex attribute description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Semantic meaning of this attribute.
    pub semantic: VertexAttributeSemantic,
    /// Component encoding.
    pub format: VertexAttributeFormat,
    /// Number of components (1..=4).
    pub dimension: u8,
    /// Byte offset within the stream.
    pub offset: u32,
    /// Index of the stream this attribute lives in.
    pub stream: u32,
}

impl VertexAttribute {
    /// Create a new vertex attribute.
    pub fn new(
        semantic: VertexAttributeSemantic,
        format: VertexAttributeFormat,
        dimension: u8,
        offset: u32,
        stream: u32,
    ) -> Self {
        Self {
            semantic,
            format,
            dimension,
            offset,
            stream,
        }
    }

    /// Create a position attribute (float3) at stream 0.
    pub fn position(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Position,
            VertexAttributeFormat::Float32,
            3,
            offset,
            0,
        )
    }

    /// Create a normal attribute (float3) at stream 0.
    pub fn normal(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Normal,
            VertexAttributeFormat::Float32,
            3,
            offset,
            0,
        )
    }

    /// Create a tangent attribute (float4) at stream 0.
    pub fn tangent(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Tangent,
            VertexAttributeFormat::Float32,
            4,
            offset,
            0,
        )
    }

    /// Create a texcoord0 attribute (float2) at stream 0.
    pub fn texcoord0(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::TexCoord0,
            VertexAttributeFormat::Float32,
            2,
            offset,
            0,
        )
    }

    /// Create a color attribute (unorm8x4) at stream 0.
    pub fn color(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Color,
            VertexAttributeFormat::Unorm8,
            4,
            offset,
            0,
        )
    }

    /// Create a joints attribute (uint16x4) at stream 0.
    pub fn joints(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Joints,
            VertexAttributeFormat::Uint16,
            4,
            offset,
            0,
        )
    }

    /// Create a weights attribute (float4) at stream 0.
    pub fn weights(offset: u32) -> Self {
        Self::new(
            VertexAttributeSemantic::Weights,
            VertexAttributeFormat::Float32,
            4,
            offset,
            0,
        )
    }

    /// Set the stream index for this attribute.
    pub fn at_stream(mut self, stream: u32) -> Self {
        self.stream = stream;
        self
    }

    /// Size in bytes of this attribute within a vertex.
    pub fn size(&self) -> u32 {
        self.format.size() as u32 * self.dimension as u32
    }

    /// Human-readable shape, e.g. `Float32x3`.
    pub fn shape(&self) -> String {
        format!("{}x{}", self.format, self.dimension)
    }
}

/// Describes the layout of vertex data across one or more streams.
///
/// See the [module documentation](self) for the invariants every layout
/// satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    strides: Vec<u32>,
    label: Option<String>,
}

impl VertexLayout {
    /// Create an empty layout (no attributes, no streams).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Define a layout from attribute descriptors with explicit offsets.
    ///
    /// Fails with [`MeshError::InvalidLayout`] if a semantic appears twice,
    /// stream indices are not contiguous from 0, two attributes of a stream
    /// overlap, a dimension is outside 1..=4, or an attribute extends past
    /// its stream's stride.
    pub fn define(attributes: impl IntoIterator<Item = VertexAttribute>) -> MeshResult<Self> {
        let attributes: Vec<VertexAttribute> = attributes.into_iter().collect();

        let mut seen = HashSet::new();
        for attr in &attributes {
            if !(1..=4).contains(&attr.dimension) {
                return Err(MeshError::InvalidLayout(format!(
                    "attribute {:?} has dimension {}, expected 1..=4",
                    attr.semantic, attr.dimension
                )));
            }
            if !seen.insert(attr.semantic) {
                return Err(MeshError::InvalidLayout(format!(
                    "attribute {:?} declared more than once",
                    attr.semantic
                )));
            }
        }

        check_stream_indices(&attributes)?;
        let stream_count = attributes.iter().map(|a| a.stream + 1).max().unwrap_or(0);
        for stream in 0..stream_count {
            if !attributes.iter().any(|a| a.stream == stream) {
                return Err(MeshError::InvalidLayout(format!(
                    "stream indices must be contiguous from 0, stream {stream} is unused"
                )));
            }
        }

        let strides = compute_strides(&attributes, stream_count);
        for (stream, &stride) in strides.iter().enumerate() {
            let mut attrs: Vec<&VertexAttribute> = attributes
                .iter()
                .filter(|a| a.stream == stream as u32)
                .collect();
            attrs.sort_by_key(|a| a.offset);
            for pair in attrs.windows(2) {
                if attribute_end(pair[0]) > pair[1].offset as u64 {
                    return Err(MeshError::InvalidLayout(format!(
                        "attributes {:?} and {:?} overlap in stream {stream}",
                        pair[0].semantic, pair[1].semantic
                    )));
                }
            }
            if let Some(last) = attrs.last() {
                if attribute_end(last) > stride as u64 {
                    return Err(MeshError::InvalidLayout(format!(
                        "attribute {:?} at offset {} exceeds stream {stream} stride {stride}",
                        last.semantic, last.offset
                    )));
                }
            }
        }

        Ok(Self {
            attributes,
            strides,
            label: None,
        })
    }

    /// Define a layout, assigning offsets by packing attributes in declaration
    /// order within each stream. Incoming offsets are ignored.
    pub fn define_packed(
        attributes: impl IntoIterator<Item = VertexAttribute>,
    ) -> MeshResult<Self> {
        let attributes: Vec<VertexAttribute> = attributes.into_iter().collect();
        check_stream_indices(&attributes)?;
        Self::define(pack_offsets(attributes))
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the layout declares no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Number of attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Attribute by declaration position.
    pub fn attribute(&self, index: usize) -> Option<&VertexAttribute> {
        self.attributes.get(index)
    }

    /// Number of streams.
    pub fn stream_count(&self) -> usize {
        self.strides.len()
    }

    /// Stride in bytes of a stream, or 0 for an unknown stream.
    pub fn stride_of(&self, stream: usize) -> u32 {
        self.strides.get(stream).copied().unwrap_or(0)
    }

    /// Check if this layout has a specific semantic.
    pub fn has_semantic(&self, semantic: VertexAttributeSemantic) -> bool {
        self.attributes.iter().any(|attr| attr.semantic == semantic)
    }

    /// Get an attribute by semantic.
    pub fn get_attribute(&self, semantic: VertexAttributeSemantic) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.semantic == semantic)
    }

    /// Get all attributes for a specific stream.
    pub fn attributes_for_stream(&self, stream: u32) -> impl Iterator<Item = &VertexAttribute> {
        self.attributes
            .iter()
            .filter(move |attr| attr.stream == stream)
    }

    /// Check if this layout is compatible with another layout.
    ///
    /// A layout is compatible if the other layout has all the semantics this one has,
    /// with matching formats and dimensions. Streams and offsets don't need to match.
    pub fn is_compatible_with(&self, other: &VertexLayout) -> bool {
        self.attributes.iter().all(|attr| {
            other.attributes.iter().any(|other_attr| {
                other_attr.semantic == attr.semantic
                    && other_attr.format == attr.format
                    && other_attr.dimension == attr.dimension
            })
        })
    }

    /// Build a preset layout. Presets are checked by the tests below.
    fn preset(label: &str, attributes: Vec<VertexAttribute>) -> Arc<Self> {
        let attributes = pack_offsets(attributes);
        let stream_count = attributes.iter().map(|a| a.stream + 1).max().unwrap_or(0);
        let strides = compute_strides(&attributes, stream_count);
        Arc::new(Self {
            attributes,
            strides,
            label: Some(label.to_string()),
        })
    }
}

/// Contiguous streams never outnumber the attributes using them.
fn check_stream_indices(attributes: &[VertexAttribute]) -> MeshResult<()> {
    match attributes.iter().find(|a| a.stream as usize >= attributes.len()) {
        Some(attr) => Err(MeshError::InvalidLayout(format!(
            "attribute {:?} uses stream {} but only {} attributes are declared",
            attr.semantic,
            attr.stream,
            attributes.len()
        ))),
        None => Ok(()),
    }
}

/// End of an attribute's byte range within its stream.
fn attribute_end(attr: &VertexAttribute) -> u64 {
    attr.offset as u64 + attr.size() as u64
}

fn compute_strides(attributes: &[VertexAttribute], stream_count: u32) -> Vec<u32> {
    (0..stream_count)
        .map(|stream| {
            attributes
                .iter()
                .filter(|a| a.stream == stream)
                .map(VertexAttribute::size)
                .sum()
        })
        .collect()
}

fn pack_offsets(attributes: impl IntoIterator<Item = VertexAttribute>) -> Vec<VertexAttribute> {
    let mut cursors: Vec<u32> = Vec::new();
    attributes
        .into_iter()
        .map(|mut attr| {
            let stream = attr.stream as usize;
            if cursors.len() <= stream {
                cursors.resize(stream + 1, 0);
            }
            attr.offset = cursors[stream];
            cursors[stream] += attr.size();
            attr
        })
        .collect()
}

// ============================================================================
// Common Layouts
// ============================================================================

impl VertexLayout {
    /// Position-only layout (12 bytes per vertex, single stream).
    pub fn position_only() -> Arc<Self> {
        Self::preset("position_only", vec![VertexAttribute::position(0)])
    }

    /// Position + normal layout (24 bytes per vertex, single stream).
    pub fn position_normal() -> Arc<Self> {
        Self::preset(
            "position_normal",
            vec![VertexAttribute::position(0), VertexAttribute::normal(0)],
        )
    }

    /// Position + texcoord layout (20 bytes per vertex, single stream).
    pub fn position_uv() -> Arc<Self> {
        Self::preset(
            "position_uv",
            vec![VertexAttribute::position(0), VertexAttribute::texcoord0(0)],
        )
    }

    /// Position + normal + texcoord layout (32 bytes per vertex, single stream).
    pub fn position_normal_uv() -> Arc<Self> {
        Self::preset(
            "position_normal_uv",
            vec![
                VertexAttribute::position(0),
                VertexAttribute::normal(0),
                VertexAttribute::texcoord0(0),
            ],
        )
    }

    /// Full PBR layout: position + normal + tangent + texcoord (48 bytes, single stream).
    pub fn pbr() -> Arc<Self> {
        Self::preset(
            "pbr",
            vec![
                VertexAttribute::position(0),
                VertexAttribute::normal(0),
                VertexAttribute::tangent(0),
                VertexAttribute::texcoord0(0),
            ],
        )
    }

    /// Animated PBR layout with static, dynamic, and skinning streams.
    ///
    /// - Stream 0 (static, 8 bytes): texcoord
    /// - Stream 1 (dynamic, 40 bytes): position, normal, tangent
    /// - Stream 2 (static, 24 bytes): joints, weights
    pub fn animated_pbr() -> Arc<Self> {
        Self::preset(
            "animated_pbr",
            vec![
                VertexAttribute::texcoord0(0).at_stream(0),
                VertexAttribute::position(0).at_stream(1),
                VertexAttribute::normal(0).at_stream(1),
                VertexAttribute::tangent(0).at_stream(1),
                VertexAttribute::joints(0).at_stream(2),
                VertexAttribute::weights(0).at_stream(2),
            ],
        )
    }
}
