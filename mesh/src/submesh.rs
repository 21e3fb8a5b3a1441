//! Sub-mesh partitioning of the index buffer.
//!
//! A [`SubMesh`] names a range of the index buffer drawn with one topology
//! (and, in a renderer, one material slot). Sub-meshes may share index ranges,
//! which is useful for batching the same indices under different topologies;
//! [`OverlapPolicy::Disjoint`] opts into strict partitioning instead.

use crate::error::{MeshError, MeshResult};
use crate::math::Aabb;

/// Primitive topology describing how indices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each index is a separate point.
    PointList,
    /// Every two indices form a line.
    LineList,
    /// Indices form a connected strip of lines.
    LineStrip,
    /// Every three indices form a triangle.
    #[default]
    TriangleList,
    /// Indices form a connected strip of triangles.
    TriangleStrip,
    /// Every four indices form a quad.
    QuadList,
}

impl PrimitiveTopology {
    /// Get the number of indices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::TriangleList => Some(3),
            Self::QuadList => Some(4),
            Self::LineStrip | Self::TriangleStrip => None, // Variable
        }
    }

    /// Number of primitives described by `index_count` indices.
    pub fn primitive_count(&self, index_count: u32) -> u32 {
        match self {
            Self::LineStrip => index_count.saturating_sub(1),
            Self::TriangleStrip => index_count.saturating_sub(2),
            _ => index_count / self.vertices_per_primitive().unwrap_or(1),
        }
    }
}

/// A contiguous range of the index buffer with a topology and base vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubMesh {
    /// How indices in the range form primitives.
    pub topology: PrimitiveTopology,
    /// First index of the range.
    pub index_start: u32,
    /// Number of indices in the range.
    pub index_count: u32,
    /// Value added to every index before it addresses the vertex buffer.
    pub base_vertex: u32,
    /// Caller-maintained bounds of the referenced vertices.
    pub bounds_hint: Option<Aabb>,
}

impl SubMesh {
    /// Create a sub-mesh without a bounds hint.
    pub fn new(
        topology: PrimitiveTopology,
        index_start: u32,
        index_count: u32,
        base_vertex: u32,
    ) -> Self {
        Self {
            topology,
            index_start,
            index_count,
            base_vertex,
            bounds_hint: None,
        }
    }

    /// Attach a bounds hint.
    pub fn with_bounds_hint(mut self, bounds: Aabb) -> Self {
        self.bounds_hint = Some(bounds);
        self
    }

    /// One past the last index of the range.
    pub fn index_end(&self) -> u64 {
        self.index_start as u64 + self.index_count as u64
    }

    /// Whether `start..start+count` lies inside this sub-mesh's range.
    pub fn contains_range(&self, start: u32, count: u32) -> bool {
        start >= self.index_start && start as u64 + count as u64 <= self.index_end()
    }
}

/// Whether sub-mesh ranges may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverlapPolicy {
    /// Ranges may overlap or appear in any order.
    #[default]
    Allow,
    /// Ranges must be sorted by start and must not overlap.
    Disjoint,
}

/// Ordered table of sub-meshes, replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct SubMeshTable {
    sub_meshes: Vec<SubMesh>,
}

impl SubMeshTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every sub-mesh.
    ///
    /// Fails with [`MeshError::InvalidRange`] if a range runs past
    /// `total_index_count` or, under [`OverlapPolicy::Disjoint`], if ranges are
    /// unsorted or overlapping. Fails with [`MeshError::InvalidArgument`] if an
    /// index count is not a whole number of primitives. On error the table is
    /// unchanged.
    pub fn set_sub_meshes(
        &mut self,
        descs: Vec<SubMesh>,
        total_index_count: u32,
        policy: OverlapPolicy,
    ) -> MeshResult<()> {
        self.replace(descs, total_index_count, policy, true)
    }

    /// Like [`set_sub_meshes`](Self::set_sub_meshes), but index counts need not
    /// be a whole number of primitives.
    pub fn set_sub_meshes_partial(
        &mut self,
        descs: Vec<SubMesh>,
        total_index_count: u32,
        policy: OverlapPolicy,
    ) -> MeshResult<()> {
        self.replace(descs, total_index_count, policy, false)
    }

    fn replace(
        &mut self,
        descs: Vec<SubMesh>,
        total_index_count: u32,
        policy: OverlapPolicy,
        whole_primitives: bool,
    ) -> MeshResult<()> {
        for (i, desc) in descs.iter().enumerate() {
            if desc.index_end() > total_index_count as u64 {
                return Err(MeshError::InvalidRange(format!(
                    "sub-mesh {i} covers indices {}..{} but the index buffer holds {}",
                    desc.index_start,
                    desc.index_end(),
                    total_index_count
                )));
            }
            if let Some(per) = desc.topology.vertices_per_primitive().filter(|_| whole_primitives) {
                if desc.index_count % per != 0 {
                    return Err(MeshError::InvalidArgument(format!(
                        "sub-mesh {i}: {} indices is not a multiple of {per} for {:?}",
                        desc.index_count, desc.topology
                    )));
                }
            }
        }

        if policy == OverlapPolicy::Disjoint {
            for (i, pair) in descs.windows(2).enumerate() {
                if pair[1].index_start < pair[0].index_start {
                    return Err(MeshError::InvalidRange(format!(
                        "sub-mesh {} starts before sub-mesh {i}",
                        i + 1
                    )));
                }
                if (pair[1].index_start as u64) < pair[0].index_end() {
                    return Err(MeshError::InvalidRange(format!(
                        "sub-meshes {i} and {} overlap",
                        i + 1
                    )));
                }
            }
        }

        log::debug!("Sub-mesh table rebuilt with {} entries", descs.len());
        self.sub_meshes = descs;
        Ok(())
    }

    /// Get a sub-mesh by position.
    pub fn get(&self, index: usize) -> MeshResult<SubMesh> {
        self.sub_meshes
            .get(index)
            .copied()
            .ok_or(MeshError::IndexOutOfRange {
                what: "sub-mesh",
                index: index as u64,
                limit: self.sub_meshes.len() as u64,
            })
    }

    /// Replace the bounds hint of one sub-mesh.
    pub fn set_bounds_hint(&mut self, index: usize, bounds: Option<Aabb>) -> MeshResult<()> {
        let limit = self.sub_meshes.len() as u64;
        let sub_mesh = self
            .sub_meshes
            .get_mut(index)
            .ok_or(MeshError::IndexOutOfRange {
                what: "sub-mesh",
                index: index as u64,
                limit,
            })?;
        sub_mesh.bounds_hint = bounds;
        Ok(())
    }

    /// Replace every bounds hint at once, in table order.
    pub(crate) fn replace_bounds_hints(&mut self, hints: Vec<Option<Aabb>>) {
        for (sub_mesh, hint) in self.sub_meshes.iter_mut().zip(hints) {
            sub_mesh.bounds_hint = hint;
        }
    }

    /// Number of sub-meshes.
    pub fn len(&self) -> usize {
        self.sub_meshes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.sub_meshes.is_empty()
    }

    /// All sub-meshes in order.
    pub fn as_slice(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    /// Iterate sub-meshes in order.
    pub fn iter(&self) -> impl Iterator<Item = &SubMesh> {
        self.sub_meshes.iter()
    }

    /// Remove every sub-mesh.
    pub fn clear(&mut self) {
        self.sub_meshes.clear();
    }
}
