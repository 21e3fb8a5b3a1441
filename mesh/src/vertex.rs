//! Per-stream vertex storage.
//!
//! A [`VertexBuffer`] owns one byte vector per layout stream, each exactly
//! `vertex_count * stride` bytes long. Attribute data is accessed by semantic
//! through typed [`VertexValue`]s, or as raw whole-vertex bytes per stream.
//!
//! # Generations and views
//!
//! Every mutating call bumps the buffer's generation. An [`AttributeView`] is
//! a lightweight token remembering the buffer and generation it was created
//! for; [`VertexBuffer::resolve`] turns it into a borrowed [`AttributeSlice`]
//! only while the generation still matches, and fails with
//! [`MeshError::StaleView`] otherwise.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{MeshError, MeshResult, check_range};
use crate::layout::{VertexAttribute, VertexAttributeSemantic, VertexLayout};
use crate::value::{VertexValue, check_compatible, decode_value, encode_value};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique buffer id.
pub(crate) fn next_buffer_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Owned vertex storage laid out according to a [`VertexLayout`].
#[derive(Debug)]
pub struct VertexBuffer {
    id: u64,
    layout: Arc<VertexLayout>,
    streams: Vec<Vec<u8>>,
    vertex_count: u32,
    generation: u64,
}

impl VertexBuffer {
    /// Create an empty buffer with no layout and no vertices.
    pub fn new() -> Self {
        Self {
            id: next_buffer_id(),
            layout: Arc::new(VertexLayout::empty()),
            streams: Vec::new(),
            vertex_count: 0,
            generation: 0,
        }
    }

    /// Resize the buffer and replace its layout.
    ///
    /// All previous contents are discarded; every stream is zero-filled to
    /// `vertex_count * stride`. Fails with [`MeshError::InvalidArgument`] when
    /// the layout is empty but `vertex_count` is not zero.
    pub fn set_params(&mut self, vertex_count: u32, layout: Arc<VertexLayout>) -> MeshResult<()> {
        if layout.is_empty() && vertex_count > 0 {
            return Err(MeshError::InvalidArgument(format!(
                "cannot allocate {vertex_count} vertices with an empty layout"
            )));
        }
        self.streams = allocate_streams(&layout, vertex_count);
        self.layout = layout;
        self.vertex_count = vertex_count;
        self.bump();
        log::debug!(
            "Vertex buffer {} resized: {} vertices, {} streams (layout {:?})",
            self.id,
            vertex_count,
            self.streams.len(),
            self.layout.label()
        );
        Ok(())
    }

    /// Replace the layout, keeping the vertex count.
    ///
    /// Existing data is not reinterpreted: storage is re-zeroed for the new
    /// layout. Fails like [`set_params`](Self::set_params).
    pub fn set_layout(&mut self, layout: Arc<VertexLayout>) -> MeshResult<()> {
        self.set_params(self.vertex_count, layout)
    }

    /// Drop every vertex, optionally keeping the layout.
    pub fn clear(&mut self, keep_layout: bool) {
        if !keep_layout {
            self.layout = Arc::new(VertexLayout::empty());
        }
        self.streams = allocate_streams(&self.layout, 0);
        self.vertex_count = 0;
        self.bump();
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Current layout.
    pub fn layout(&self) -> &Arc<VertexLayout> {
        &self.layout
    }

    /// Current generation. Increases on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Process-unique id of this buffer.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of streams.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Stride in bytes of a stream.
    pub fn stride_of(&self, stream: usize) -> u32 {
        self.layout.stride_of(stream)
    }

    /// Raw bytes of one stream.
    pub fn stream_data(&self, stream: usize) -> Option<&[u8]> {
        self.streams.get(stream).map(|s| s.as_slice())
    }

    /// Raw bytes of every stream, in stream order.
    pub fn streams(&self) -> impl Iterator<Item = &[u8]> {
        self.streams.iter().map(|s| s.as_slice())
    }

    fn attribute(&self, semantic: VertexAttributeSemantic) -> MeshResult<VertexAttribute> {
        self.layout
            .get_attribute(semantic)
            .copied()
            .ok_or(MeshError::AttributeNotPresent(semantic))
    }

    /// Write `count` values of an attribute starting at vertex `range_start`.
    ///
    /// Only the first `count` entries of `values` are used. The write is
    /// all-or-nothing: on error the buffer is untouched.
    pub fn write_attribute<T: VertexValue>(
        &mut self,
        semantic: VertexAttributeSemantic,
        values: &[T],
        range_start: u32,
        count: u32,
    ) -> MeshResult<()> {
        let attr = self.attribute(semantic)?;
        check_compatible::<T>(&attr)?;
        if values.len() < count as usize {
            return Err(MeshError::InvalidArgument(format!(
                "{count} values requested but only {} supplied",
                values.len()
            )));
        }
        check_range(range_start, count, self.vertex_count)?;

        let stride = self.layout.stride_of(attr.stream as usize) as usize;
        let size = attr.size() as usize;
        let stream = &mut self.streams[attr.stream as usize];
        for (i, value) in values[..count as usize].iter().enumerate() {
            let start = (range_start as usize + i) * stride + attr.offset as usize;
            encode_value(&attr, value, &mut stream[start..start + size]);
        }
        self.bump();
        log::trace!(
            "Wrote {count} {semantic:?} values at vertex {range_start} (buffer {})",
            self.id
        );
        Ok(())
    }

    /// Write every vertex of an attribute; `values` must hold `vertex_count` entries.
    pub fn write_attribute_all<T: VertexValue>(
        &mut self,
        semantic: VertexAttributeSemantic,
        values: &[T],
    ) -> MeshResult<()> {
        if values.len() != self.vertex_count as usize {
            return Err(MeshError::CountMismatch {
                what: "attribute values",
                expected: self.vertex_count as u64,
                actual: values.len() as u64,
            });
        }
        self.write_attribute(semantic, values, 0, self.vertex_count)
    }

    /// Read a copy of every vertex's value for an attribute.
    pub fn read_attribute<T: VertexValue>(
        &self,
        semantic: VertexAttributeSemantic,
    ) -> MeshResult<Vec<T>> {
        self.read_attribute_range(semantic, 0, self.vertex_count)
    }

    /// Read a copy of `count` values starting at vertex `range_start`.
    pub fn read_attribute_range<T: VertexValue>(
        &self,
        semantic: VertexAttributeSemantic,
        range_start: u32,
        count: u32,
    ) -> MeshResult<Vec<T>> {
        let attr = self.attribute(semantic)?;
        check_compatible::<T>(&attr)?;
        check_range(range_start, count, self.vertex_count)?;
        let slice = self.slice_for(attr);
        Ok((range_start..range_start + count)
            .map(|i| decode_value(&attr, slice.element_bytes(i)))
            .collect())
    }

    /// Overwrite whole vertices of one stream with raw bytes.
    ///
    /// `data` must be a multiple of the stream stride; it is copied starting at
    /// vertex `vertex_start`.
    pub fn write_stream(
        &mut self,
        stream: usize,
        data: &[u8],
        vertex_start: u32,
    ) -> MeshResult<()> {
        if stream >= self.streams.len() {
            return Err(MeshError::InvalidArgument(format!(
                "stream {stream} does not exist ({} streams)",
                self.streams.len()
            )));
        }
        let stride = self.layout.stride_of(stream) as usize;
        if data.len() % stride != 0 {
            return Err(MeshError::InvalidArgument(format!(
                "{} bytes is not a whole number of {stride}-byte vertices",
                data.len()
            )));
        }
        let count = u32::try_from(data.len() / stride).map_err(|_| MeshError::RangeOutOfBounds {
            start: vertex_start as u64,
            count: (data.len() / stride) as u64,
            len: self.vertex_count as u64,
        })?;
        check_range(vertex_start, count, self.vertex_count)?;

        let start = vertex_start as usize * stride;
        self.streams[stream][start..start + data.len()].copy_from_slice(data);
        self.bump();
        Ok(())
    }

    /// Create a view token for an attribute at the current generation.
    pub fn attribute_view(&self, semantic: VertexAttributeSemantic) -> MeshResult<AttributeView> {
        let attribute = self.attribute(semantic)?;
        Ok(AttributeView {
            buffer_id: self.id,
            generation: self.generation,
            attribute,
        })
    }

    /// Borrow the data behind a view.
    ///
    /// Fails with [`MeshError::StaleView`] if the buffer was mutated since the
    /// view was created, and [`MeshError::InvalidArgument`] if the view belongs
    /// to another buffer.
    pub fn resolve(&self, view: &AttributeView) -> MeshResult<AttributeSlice<'_>> {
        if view.buffer_id != self.id {
            return Err(MeshError::InvalidArgument(format!(
                "view belongs to vertex buffer {}, not {}",
                view.buffer_id, self.id
            )));
        }
        if view.generation != self.generation {
            return Err(MeshError::StaleView {
                view: view.generation,
                current: self.generation,
            });
        }
        Ok(self.slice_for(view.attribute))
    }

    fn slice_for(&self, attribute: VertexAttribute) -> AttributeSlice<'_> {
        AttributeSlice {
            attribute,
            data: &self.streams[attribute.stream as usize],
            stride: self.layout.stride_of(attribute.stream as usize) as usize,
            len: self.vertex_count,
        }
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for VertexBuffer {
    /// Clones get a fresh id, so views of the original do not resolve on the copy.
    fn clone(&self) -> Self {
        Self {
            id: next_buffer_id(),
            layout: self.layout.clone(),
            streams: self.streams.clone(),
            vertex_count: self.vertex_count,
            generation: self.generation,
        }
    }
}

fn allocate_streams(layout: &VertexLayout, vertex_count: u32) -> Vec<Vec<u8>> {
    (0..layout.stream_count())
        .map(|s| vec![0u8; vertex_count as usize * layout.stride_of(s) as usize])
        .collect()
}

/// A view token for one attribute of a [`VertexBuffer`] at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeView {
    buffer_id: u64,
    generation: u64,
    attribute: VertexAttribute,
}

impl AttributeView {
    /// Generation the view was created at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The attribute this view refers to.
    pub fn attribute(&self) -> &VertexAttribute {
        &self.attribute
    }
}

/// Borrowed, strided access to one attribute's data.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSlice<'a> {
    attribute: VertexAttribute,
    data: &'a [u8],
    stride: usize,
    len: u32,
}

impl<'a> AttributeSlice<'a> {
    /// Number of vertices.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The attribute description.
    pub fn attribute(&self) -> &VertexAttribute {
        &self.attribute
    }

    /// Encoded bytes of one vertex's attribute value. Panics if `index >= len`.
    pub fn element_bytes(&self, index: u32) -> &'a [u8] {
        let start = index as usize * self.stride + self.attribute.offset as usize;
        &self.data[start..start + self.attribute.size() as usize]
    }

    /// Decode one value.
    pub fn get<T: VertexValue>(&self, index: u32) -> MeshResult<T> {
        check_compatible::<T>(&self.attribute)?;
        if index >= self.len {
            return Err(MeshError::IndexOutOfRange {
                what: "vertex",
                index: index as u64,
                limit: self.len as u64,
            });
        }
        Ok(decode_value(&self.attribute, self.element_bytes(index)))
    }

    /// Decode every value into a new vector.
    pub fn to_vec<T: VertexValue>(&self) -> MeshResult<Vec<T>> {
        check_compatible::<T>(&self.attribute)?;
        Ok((0..self.len)
            .map(|i| decode_value(&self.attribute, self.element_bytes(i)))
            .collect())
    }
}
