//! Index storage.
//!
//! An [`IndexBuffer`] holds 16- or 32-bit indices. Writes are checked against a
//! caller-supplied vertex limit so a dangling index never enters the buffer,
//! and against the 16-bit range when the buffer uses [`IndexFormat::Uint16`].

use crate::error::{MeshError, MeshResult, check_range};
use crate::vertex::next_buffer_id;

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max index 65535).
    #[default]
    Uint16,
    /// 32-bit unsigned integers.
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Largest index value the format can store.
    pub fn max_value(&self) -> u32 {
        match self {
            Self::Uint16 => u16::MAX as u32,
            Self::Uint32 => u32::MAX,
        }
    }
}

#[derive(Debug, Clone)]
enum IndexStorage {
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
}

impl IndexStorage {
    fn len(&self) -> usize {
        match self {
            Self::Uint16(v) => v.len(),
            Self::Uint32(v) => v.len(),
        }
    }

    fn get(&self, i: usize) -> u32 {
        match self {
            Self::Uint16(v) => v[i] as u32,
            Self::Uint32(v) => v[i],
        }
    }
}

/// Owned index storage.
#[derive(Debug)]
pub struct IndexBuffer {
    id: u64,
    storage: IndexStorage,
    generation: u64,
}

impl IndexBuffer {
    /// Create an empty 16-bit index buffer.
    pub fn new() -> Self {
        Self {
            id: next_buffer_id(),
            storage: IndexStorage::Uint16(Vec::new()),
            generation: 0,
        }
    }

    /// Resize the buffer and set its format. Previous contents are discarded
    /// and every index is reset to 0.
    pub fn set_params(&mut self, index_count: u32, format: IndexFormat) -> MeshResult<()> {
        self.storage = match format {
            IndexFormat::Uint16 => IndexStorage::Uint16(vec![0; index_count as usize]),
            IndexFormat::Uint32 => IndexStorage::Uint32(vec![0; index_count as usize]),
        };
        self.bump();
        log::debug!(
            "Index buffer {} resized: {} indices ({:?})",
            self.id,
            index_count,
            format
        );
        Ok(())
    }

    /// Drop every index, keeping the format.
    pub fn clear(&mut self) {
        self.storage = match self.format() {
            IndexFormat::Uint16 => IndexStorage::Uint16(Vec::new()),
            IndexFormat::Uint32 => IndexStorage::Uint32(Vec::new()),
        };
        self.bump();
    }

    /// Write `count` indices starting at position `range_start`.
    ///
    /// Only the first `count` entries of `indices` are used. Every value must
    /// be below `max_vertex_index_allowed` (normally the current vertex count),
    /// otherwise the call fails with [`MeshError::IndexOutOfRange`]; that check
    /// applies to every buffer size, including zero. Values above 65535 fail
    /// with [`MeshError::IndexOverflow`] on a 16-bit buffer. The write is
    /// all-or-nothing.
    pub fn write(
        &mut self,
        indices: &[u32],
        range_start: u32,
        count: u32,
        max_vertex_index_allowed: u32,
    ) -> MeshResult<()> {
        if indices.len() < count as usize {
            return Err(MeshError::InvalidArgument(format!(
                "{count} indices requested but only {} supplied",
                indices.len()
            )));
        }
        let values = &indices[..count as usize];
        if let Some(&bad) = values.iter().find(|&&v| v >= max_vertex_index_allowed) {
            return Err(MeshError::IndexOutOfRange {
                what: "vertex index",
                index: bad as u64,
                limit: max_vertex_index_allowed as u64,
            });
        }
        check_range(range_start, count, self.index_count())?;
        if self.format() == IndexFormat::Uint16 {
            if let Some(&big) = values.iter().find(|&&v| v > u16::MAX as u32) {
                return Err(MeshError::IndexOverflow(big));
            }
        }

        let start = range_start as usize;
        match &mut self.storage {
            IndexStorage::Uint16(data) => {
                for (dst, &v) in data[start..start + values.len()].iter_mut().zip(values) {
                    *dst = v as u16;
                }
            }
            IndexStorage::Uint32(data) => {
                data[start..start + values.len()].copy_from_slice(values);
            }
        }
        self.bump();
        log::trace!("Wrote {count} indices at {range_start} (buffer {})", self.id);
        Ok(())
    }

    /// Index format.
    pub fn format(&self) -> IndexFormat {
        match self.storage {
            IndexStorage::Uint16(_) => IndexFormat::Uint16,
            IndexStorage::Uint32(_) => IndexFormat::Uint32,
        }
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.storage.len() as u32
    }

    /// Whether the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Current generation. Increases on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Process-unique id of this buffer.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Read a single index.
    pub fn get(&self, position: u32) -> MeshResult<u32> {
        if position >= self.index_count() {
            return Err(MeshError::IndexOutOfRange {
                what: "index position",
                index: position as u64,
                limit: self.index_count() as u64,
            });
        }
        Ok(self.storage.get(position as usize))
    }

    /// Copy `count` indices starting at `range_start`, widened to `u32`.
    pub fn range(&self, range_start: u32, count: u32) -> MeshResult<Vec<u32>> {
        check_range(range_start, count, self.index_count())?;
        Ok(self.iter_range(range_start, count).collect())
    }

    /// Copy of every index, widened to `u32`.
    pub fn to_vec(&self) -> Vec<u32> {
        self.iter_range(0, self.index_count()).collect()
    }

    /// Iterate a range that is known to be in bounds.
    pub(crate) fn iter_range(&self, range_start: u32, count: u32) -> impl Iterator<Item = u32> {
        let start = range_start as usize;
        (start..start + count as usize).map(move |i| self.storage.get(i))
    }

    /// Largest stored index, or `None` for an empty buffer.
    pub fn max_index(&self) -> Option<u32> {
        self.iter_range(0, self.index_count()).max()
    }

    /// Raw index bytes in the buffer's format.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            IndexStorage::Uint16(v) => bytemuck::cast_slice(v),
            IndexStorage::Uint32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Create a view token at the current generation.
    pub fn view(&self) -> IndexView {
        IndexView {
            buffer_id: self.id,
            generation: self.generation,
        }
    }

    /// Borrow the raw index bytes behind a view.
    ///
    /// Fails with [`MeshError::StaleView`] if the buffer was mutated since the
    /// view was created.
    pub fn resolve(&self, view: &IndexView) -> MeshResult<&[u8]> {
        if view.buffer_id != self.id {
            return Err(MeshError::InvalidArgument(format!(
                "view belongs to index buffer {}, not {}",
                view.buffer_id, self.id
            )));
        }
        if view.generation != self.generation {
            return Err(MeshError::StaleView {
                view: view.generation,
                current: self.generation,
            });
        }
        Ok(self.as_bytes())
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for IndexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IndexBuffer {
    fn clone(&self) -> Self {
        Self {
            id: next_buffer_id(),
            storage: self.storage.clone(),
            generation: self.generation,
        }
    }
}

/// A view token for an [`IndexBuffer`] at a given generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexView {
    buffer_id: u64,
    generation: u64,
}

impl IndexView {
    /// Generation the view was created at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
