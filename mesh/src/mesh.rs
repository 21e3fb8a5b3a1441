//! The mesh aggregate.
//!
//! A [`Mesh`] owns one vertex buffer, one index buffer, the sub-mesh and LOD
//! tables, skinning data and blend shapes. It forwards to the individual
//! components and supplies the cross-component arguments they need: the
//! vertex count for index writes and skinning, the index count for sub-meshes,
//! and the sub-mesh table for LODs.
//!
//! # Invariants
//!
//! - Every stored index is below the current vertex count.
//! - Every sub-mesh range lies inside the index buffer.
//! - Every LOD range lies inside its sub-mesh.
//! - Skinning data and blend shapes always match the vertex count; they are
//!   dropped whenever the count changes.

use std::sync::Arc;

use crate::blend_shape::BlendShapeSet;
use crate::error::{MeshError, MeshResult};
use crate::flags::MeshUpdateFlags;
use crate::index::{IndexBuffer, IndexFormat, IndexView};
use crate::layout::{VertexAttributeSemantic, VertexLayout};
use crate::lod::{LodLevel, LodSelectionCurve, LodTable, MetricProvider};
use crate::math::{Aabb, Mat4, Vec3};
use crate::skinning::{BoneWeight, SkinningData};
use crate::submesh::{OverlapPolicy, SubMesh, SubMeshTable};
use crate::upload::{MeshSnapshot, UploadTarget};
use crate::value::VertexValue;
use crate::vertex::{AttributeSlice, AttributeView, VertexBuffer};

/// Descriptor for creating a mesh.
///
/// # Example
///
/// ```
/// use redlilium_mesh::{IndexFormat, Mesh, MeshDescriptor, VertexLayout};
///
/// let desc = MeshDescriptor::new(VertexLayout::position_normal_uv())
///     .with_vertex_count(24)
///     .with_indices(IndexFormat::Uint16, 36)
///     .with_label("cube");
/// let mesh = Mesh::from_descriptor(desc).unwrap();
/// assert_eq!(mesh.vertex_count(), 24);
/// ```
#[derive(Debug, Clone)]
pub struct MeshDescriptor {
    /// Vertex layout (shared via Arc).
    pub layout: Arc<VertexLayout>,
    /// Number of vertices.
    pub vertex_count: u32,
    /// Index format.
    pub index_format: IndexFormat,
    /// Number of indices (0 for non-indexed).
    pub index_count: u32,
    /// Whether sub-mesh ranges may overlap.
    pub overlap_policy: OverlapPolicy,
    /// Optional label for debugging.
    pub label: Option<String>,
}

impl MeshDescriptor {
    /// Create a new mesh descriptor with the given layout.
    pub fn new(layout: Arc<VertexLayout>) -> Self {
        Self {
            layout,
            vertex_count: 0,
            index_format: IndexFormat::default(),
            index_count: 0,
            overlap_policy: OverlapPolicy::default(),
            label: None,
        }
    }

    /// Set the vertex count.
    pub fn with_vertex_count(mut self, count: u32) -> Self {
        self.vertex_count = count;
        self
    }

    /// Set indexed drawing with the given format and count.
    pub fn with_indices(mut self, format: IndexFormat, count: u32) -> Self {
        self.index_format = format;
        self.index_count = count;
        self
    }

    /// Set the sub-mesh overlap policy.
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Check if this mesh uses indexed drawing.
    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }

    /// Compute the required size for a specific vertex stream.
    pub fn vertex_buffer_size(&self, stream: usize) -> u64 {
        self.vertex_count as u64 * self.layout.stride_of(stream) as u64
    }

    /// Compute the required index buffer size in bytes.
    pub fn index_buffer_size(&self) -> u64 {
        self.index_count as u64 * self.index_format.size() as u64
    }

    /// Get the number of vertex streams needed.
    pub fn stream_count(&self) -> usize {
        self.layout.stream_count()
    }
}

/// CPU-side mesh geometry.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: VertexBuffer,
    indices: IndexBuffer,
    sub_meshes: SubMeshTable,
    lods: LodTable,
    lod_curve: LodSelectionCurve,
    skinning: SkinningData,
    blend_shapes: BlendShapeSet,
    bounds: Option<Aabb>,
    overlap_policy: OverlapPolicy,
    label: Option<String>,
}

impl Mesh {
    /// Create an empty mesh: no layout, no vertices, no indices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with buffers sized according to a descriptor.
    ///
    /// All vertex data and indices start zeroed.
    pub fn from_descriptor(desc: MeshDescriptor) -> MeshResult<Self> {
        let mut mesh = Self::new();
        mesh.label = desc.label;
        mesh.overlap_policy = desc.overlap_policy;
        mesh.set_vertex_buffer_params(desc.vertex_count, desc.layout, MeshUpdateFlags::empty())?;
        mesh.set_index_buffer_params(desc.index_count, desc.index_format)?;
        Ok(mesh)
    }

    /// Debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Set or clear the debug label.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    // --- Vertex data ---

    /// Resize the vertex buffer and replace its layout.
    ///
    /// All vertex data is reset to zero. Fails with
    /// [`MeshError::IndexOutOfRange`] if a stored index (or, unless
    /// [`MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES`] is set, a sub-mesh
    /// vertex reference) would no longer address a vertex. Skinning data and
    /// blend shapes are dropped when the vertex count changes.
    pub fn set_vertex_buffer_params(
        &mut self,
        vertex_count: u32,
        layout: Arc<VertexLayout>,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        if let Some(max) = self.indices.max_index() {
            if max >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    what: "vertex index",
                    index: max as u64,
                    limit: vertex_count as u64,
                });
            }
        }
        if !flags.contains(MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES) {
            self.check_sub_mesh_vertices(self.sub_meshes.as_slice(), vertex_count)?;
        }

        let count_changed = vertex_count != self.vertices.vertex_count();
        self.vertices.set_params(vertex_count, layout)?;
        if count_changed {
            self.skinning.clear();
            self.blend_shapes.clear();
        }
        self.apply_flags(flags);
        Ok(())
    }

    /// Replace the vertex layout keeping the vertex count. Data is re-zeroed.
    pub fn set_vertex_layout(&mut self, layout: Arc<VertexLayout>) -> MeshResult<()> {
        self.vertices.set_layout(layout)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertices.vertex_count()
    }

    /// Current vertex layout.
    pub fn vertex_layout(&self) -> &Arc<VertexLayout> {
        self.vertices.layout()
    }

    /// The vertex buffer.
    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertices
    }

    /// Write `count` attribute values starting at vertex `range_start`.
    pub fn write_attribute<T: VertexValue>(
        &mut self,
        semantic: VertexAttributeSemantic,
        values: &[T],
        range_start: u32,
        count: u32,
    ) -> MeshResult<()> {
        self.vertices.write_attribute(semantic, values, range_start, count)
    }

    /// Write every vertex of an attribute.
    pub fn write_attribute_all<T: VertexValue>(
        &mut self,
        semantic: VertexAttributeSemantic,
        values: &[T],
    ) -> MeshResult<()> {
        self.vertices.write_attribute_all(semantic, values)
    }

    /// Read a copy of an attribute for every vertex.
    pub fn read_attribute<T: VertexValue>(
        &self,
        semantic: VertexAttributeSemantic,
    ) -> MeshResult<Vec<T>> {
        self.vertices.read_attribute(semantic)
    }

    /// Read a copy of `count` attribute values starting at `range_start`.
    pub fn read_attribute_range<T: VertexValue>(
        &self,
        semantic: VertexAttributeSemantic,
        range_start: u32,
        count: u32,
    ) -> MeshResult<Vec<T>> {
        self.vertices.read_attribute_range(semantic, range_start, count)
    }

    /// Overwrite whole vertices of one stream with raw bytes.
    pub fn write_stream(
        &mut self,
        stream: usize,
        data: &[u8],
        vertex_start: u32,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        self.vertices.write_stream(stream, data, vertex_start)?;
        self.apply_flags(flags);
        Ok(())
    }

    /// Create a view token for an attribute.
    pub fn attribute_view(&self, semantic: VertexAttributeSemantic) -> MeshResult<AttributeView> {
        self.vertices.attribute_view(semantic)
    }

    /// Borrow attribute data through a view.
    pub fn resolve_attribute(&self, view: &AttributeView) -> MeshResult<AttributeSlice<'_>> {
        self.vertices.resolve(view)
    }

    // --- Index data ---

    /// Resize the index buffer and set its format. Every index is reset to 0.
    ///
    /// Fails with [`MeshError::IndexOutOfRange`] when indices are requested
    /// but the mesh has no vertices, and [`MeshError::InvalidRange`] when an
    /// existing sub-mesh would extend past the new index count.
    pub fn set_index_buffer_params(
        &mut self,
        index_count: u32,
        format: IndexFormat,
    ) -> MeshResult<()> {
        if index_count > 0 && self.vertices.vertex_count() == 0 {
            return Err(MeshError::IndexOutOfRange {
                what: "vertex index",
                index: 0,
                limit: 0,
            });
        }
        if let Some((i, sub_mesh)) = self
            .sub_meshes
            .iter()
            .enumerate()
            .find(|(_, s)| s.index_end() > index_count as u64)
        {
            return Err(MeshError::InvalidRange(format!(
                "sub-mesh {i} covers indices {}..{} but the index buffer is being resized \
                 to {index_count}",
                sub_mesh.index_start,
                sub_mesh.index_end()
            )));
        }
        self.indices.set_params(index_count, format)
    }

    /// Write `count` indices starting at position `range_start`.
    ///
    /// Every value must be below the vertex count. Unless
    /// [`MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES`] is set, values
    /// landing inside a sub-mesh must also address an existing vertex once the
    /// sub-mesh's base vertex is added.
    pub fn write_indices(
        &mut self,
        indices: &[u32],
        range_start: u32,
        count: u32,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        let vertex_count = self.vertices.vertex_count();
        if !flags.contains(MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES) {
            if let Some(values) = indices.get(..count as usize) {
                self.check_written_indices(values, range_start, vertex_count)?;
            }
        }
        self.indices.write(indices, range_start, count, vertex_count)?;
        self.apply_flags(flags);
        Ok(())
    }

    /// Index format.
    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.indices.index_count()
    }

    /// The index buffer.
    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.indices
    }

    /// Create a view token for the index data.
    pub fn index_view(&self) -> IndexView {
        self.indices.view()
    }

    /// Borrow raw index bytes through a view.
    pub fn resolve_indices(&self, view: &IndexView) -> MeshResult<&[u8]> {
        self.indices.resolve(view)
    }

    /// Indices of a sub-mesh, or of one of its LOD levels.
    ///
    /// With `apply_base_vertex`, the sub-mesh's base vertex is added to every
    /// value so the result addresses the vertex buffer directly.
    pub fn get_indices(
        &self,
        sub_mesh_index: u32,
        apply_base_vertex: bool,
        lod: Option<u32>,
    ) -> MeshResult<Vec<u32>> {
        let sub_mesh = self.sub_meshes.get(sub_mesh_index as usize)?;
        let (start, count) = match lod {
            Some(level) => {
                let level = self.lods.get(sub_mesh_index, level)?;
                (level.index_start, level.index_count)
            }
            None => (sub_mesh.index_start, sub_mesh.index_count),
        };
        let base = if apply_base_vertex {
            sub_mesh.base_vertex
        } else {
            0
        };
        self.indices
            .iter_range(start, count)
            .map(|i| {
                i.checked_add(base).ok_or(MeshError::IndexOutOfRange {
                    what: "vertex index",
                    index: i as u64 + base as u64,
                    limit: u32::MAX as u64,
                })
            })
            .collect()
    }

    // --- Sub-meshes ---

    /// Replace the sub-mesh table. Every LOD list is reset.
    ///
    /// With [`MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES`] only the
    /// index range bounds and the overlap policy are checked.
    pub fn set_sub_meshes(
        &mut self,
        descs: Vec<SubMesh>,
        flags: MeshUpdateFlags,
    ) -> MeshResult<()> {
        let mut staged = SubMeshTable::new();
        let index_count = self.indices.index_count();
        if flags.contains(MeshUpdateFlags::DONT_VALIDATE_SUB_MESH_VERTICES) {
            staged.set_sub_meshes_partial(descs, index_count, self.overlap_policy)?;
        } else {
            staged.set_sub_meshes(descs, index_count, self.overlap_policy)?;
            self.check_sub_mesh_vertices(staged.as_slice(), self.vertices.vertex_count())?;
        }
        self.lods.reset(staged.len());
        self.sub_meshes = staged;
        self.apply_flags(flags);
        Ok(())
    }

    /// Number of sub-meshes.
    pub fn sub_mesh_count(&self) -> u32 {
        self.sub_meshes.len() as u32
    }

    /// One sub-mesh.
    pub fn sub_mesh(&self, index: u32) -> MeshResult<SubMesh> {
        self.sub_meshes.get(index as usize)
    }

    /// All sub-meshes.
    pub fn sub_meshes(&self) -> &[SubMesh] {
        self.sub_meshes.as_slice()
    }

    /// Set the bounds hint of one sub-mesh.
    pub fn set_sub_mesh_bounds_hint(&mut self, index: u32, bounds: Option<Aabb>) -> MeshResult<()> {
        self.sub_meshes.set_bounds_hint(index as usize, bounds)
    }

    /// Overlap policy applied by [`set_sub_meshes`](Self::set_sub_meshes).
    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap_policy
    }

    /// Change the overlap policy. The current table is not re-validated.
    pub fn set_overlap_policy(&mut self, policy: OverlapPolicy) {
        self.overlap_policy = policy;
    }

    // --- LODs ---

    /// Replace the LOD levels of one sub-mesh.
    pub fn set_lods(&mut self, sub_mesh_index: u32, levels: Vec<LodLevel>) -> MeshResult<()> {
        self.lods.set_lods(sub_mesh_index, levels, &self.sub_meshes)
    }

    /// Number of LOD levels of a sub-mesh.
    pub fn lod_count(&self, sub_mesh_index: u32) -> MeshResult<u32> {
        self.lods.level_count(sub_mesh_index)
    }

    /// One LOD level.
    pub fn lod(&self, sub_mesh_index: u32, level_index: u32) -> MeshResult<LodLevel> {
        self.lods.get(sub_mesh_index, level_index)
    }

    /// All LOD levels of a sub-mesh.
    pub fn lods(&self, sub_mesh_index: u32) -> MeshResult<&[LodLevel]> {
        self.lods.levels(sub_mesh_index)
    }

    /// Replace the curve used by [`select_lod`](Self::select_lod).
    pub fn set_lod_selection_curve(&mut self, curve: LodSelectionCurve) {
        self.lod_curve = curve;
    }

    /// Curve used by [`select_lod`](Self::select_lod).
    pub fn lod_selection_curve(&self) -> &LodSelectionCurve {
        &self.lod_curve
    }

    /// Level of a sub-mesh to draw for a metric.
    pub fn select_lod(&self, sub_mesh_index: u32, metric: f32) -> MeshResult<u32> {
        self.lods.select_level(sub_mesh_index, metric, &self.lod_curve)
    }

    /// Level of a sub-mesh to draw for a viewer, with the metric taken from `provider`.
    pub fn select_lod_for<V, P>(
        &self,
        sub_mesh_index: u32,
        provider: &P,
        viewer: &V,
    ) -> MeshResult<u32>
    where
        V: ?Sized,
        P: MetricProvider<V> + ?Sized,
    {
        self.select_lod(sub_mesh_index, provider.metric(viewer))
    }

    // --- Bounds ---

    /// Bounds of the vertices referenced by one sub-mesh.
    ///
    /// Computed on every call; nothing is cached. Returns `None` for an empty
    /// sub-mesh.
    pub fn compute_sub_mesh_bounds(&self, index: u32) -> MeshResult<Option<Aabb>> {
        let sub_mesh = self.sub_meshes.get(index as usize)?;
        let positions = self.positions()?;
        self.sub_mesh_bounds(&positions, &sub_mesh)
    }

    /// Recompute and store the mesh bounds and every sub-mesh bounds hint.
    ///
    /// Mesh bounds cover every vertex. Fails with
    /// [`MeshError::AttributeNotPresent`] when the layout has no position.
    pub fn recalculate_bounds(&mut self) -> MeshResult<()> {
        let positions = self.positions()?;
        let bounds = Aabb::from_points(positions.to_vec::<Vec3>()?);
        let hints = self
            .sub_meshes
            .iter()
            .map(|s| self.sub_mesh_bounds(&positions, s))
            .collect::<MeshResult<Vec<_>>>()?;
        self.bounds = bounds;
        self.sub_meshes.replace_bounds_hints(hints);
        Ok(())
    }

    /// Stored mesh bounds.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Overwrite the stored mesh bounds.
    pub fn set_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
    }

    // --- Skinning ---

    /// Attach bone weights and bind poses.
    pub fn attach_skinning(
        &mut self,
        bones_per_vertex: Vec<u8>,
        weights: Vec<BoneWeight>,
        bind_poses: Vec<Mat4>,
    ) -> MeshResult<()> {
        let vertex_count = self.vertices.vertex_count();
        self.skinning.attach(bones_per_vertex, weights, bind_poses, vertex_count)
    }

    /// Replace only the bind poses.
    pub fn set_bind_poses(&mut self, bind_poses: Vec<Mat4>) {
        self.skinning.set_bind_poses(bind_poses);
    }

    /// Drop all skinning data.
    pub fn clear_skinning(&mut self) {
        self.skinning.clear();
    }

    /// Skinning data.
    pub fn skinning(&self) -> &SkinningData {
        &self.skinning
    }

    // --- Blend shapes ---

    /// Add a blend shape frame; see [`BlendShapeSet::add_frame`].
    pub fn add_blend_shape_frame(
        &mut self,
        name: &str,
        weight: f32,
        delta_vertices: Vec<Vec3>,
        delta_normals: Option<Vec<Vec3>>,
        delta_tangents: Option<Vec<Vec3>>,
    ) -> MeshResult<()> {
        let vertex_count = self.vertices.vertex_count();
        self.blend_shapes.add_frame(
            name,
            weight,
            delta_vertices,
            delta_normals,
            delta_tangents,
            vertex_count,
        )
    }

    /// Blend shapes.
    pub fn blend_shapes(&self) -> &BlendShapeSet {
        &self.blend_shapes
    }

    /// Remove every blend shape.
    pub fn clear_blend_shapes(&mut self) {
        self.blend_shapes.clear();
    }

    // --- Whole mesh ---

    /// Drop all geometry, optionally keeping the vertex layout.
    pub fn clear(&mut self, keep_vertex_layout: bool) {
        self.vertices.clear(keep_vertex_layout);
        self.indices.clear();
        self.sub_meshes.clear();
        self.lods.reset(0);
        self.skinning.clear();
        self.blend_shapes.clear();
        self.bounds = None;
        log::debug!(
            "Mesh {:?} cleared (layout kept: {keep_vertex_layout})",
            self.label
        );
    }

    /// Borrow the current contents for upload.
    pub fn snapshot(&self) -> MeshSnapshot<'_> {
        MeshSnapshot {
            label: self.label.as_deref(),
            layout: self.vertices.layout().as_ref(),
            vertex_count: self.vertices.vertex_count(),
            vertex_generation: self.vertices.generation(),
            vertex_streams: self.vertices.streams().collect(),
            index_format: self.indices.format(),
            index_count: self.indices.index_count(),
            index_generation: self.indices.generation(),
            index_data: self.indices.as_bytes(),
            sub_meshes: self.sub_meshes.as_slice(),
            lods: &self.lods,
            bounds: self.bounds,
        }
    }

    /// Hand the current contents to an upload target, once.
    pub fn upload<T: UploadTarget + ?Sized>(&self, target: &mut T) -> MeshResult<()> {
        log::debug!(
            "Uploading mesh {:?}: {} vertices, {} indices, {} sub-meshes",
            self.label,
            self.vertices.vertex_count(),
            self.indices.index_count(),
            self.sub_meshes.len()
        );
        target.upload(&self.snapshot())
    }

    // --- Internals ---

    fn positions(&self) -> MeshResult<AttributeSlice<'_>> {
        let view = self.vertices.attribute_view(VertexAttributeSemantic::Position)?;
        self.vertices.resolve(&view)
    }

    fn sub_mesh_bounds(
        &self,
        positions: &AttributeSlice<'_>,
        sub_mesh: &SubMesh,
    ) -> MeshResult<Option<Aabb>> {
        let mut bounds: Option<Aabb> = None;
        for index in self
            .indices
            .iter_range(sub_mesh.index_start, sub_mesh.index_count)
        {
            let vertex = sub_mesh.base_vertex as u64 + index as u64;
            if vertex >= positions.len() as u64 {
                return Err(MeshError::IndexOutOfRange {
                    what: "sub-mesh vertex",
                    index: vertex,
                    limit: positions.len() as u64,
                });
            }
            let point: Vec3 = positions.get(vertex as u32)?;
            match bounds.as_mut() {
                Some(b) => b.expand(point),
                None => bounds = Some(Aabb::from_point(point)),
            }
        }
        Ok(bounds)
    }

    /// Best-effort bounds refresh after a successful mutation. Never fails:
    /// missing positions clear the bounds and an unresolvable sub-mesh gets no hint.
    fn refresh_bounds(&mut self) {
        let (bounds, hints) = match self.positions() {
            Ok(positions) => {
                let bounds = positions.to_vec::<Vec3>().ok().and_then(Aabb::from_points);
                let hints = self
                    .sub_meshes
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        self.sub_mesh_bounds(&positions, s).unwrap_or_else(|e| {
                            log::warn!("Bounds of sub-mesh {i} not recalculated: {e}");
                            None
                        })
                    })
                    .collect();
                (bounds, hints)
            }
            Err(_) => (None, vec![None; self.sub_meshes.len()]),
        };
        self.bounds = bounds;
        self.sub_meshes.replace_bounds_hints(hints);
    }

    fn apply_flags(&mut self, flags: MeshUpdateFlags) {
        if flags.contains(MeshUpdateFlags::RECALCULATE_BOUNDS) {
            self.refresh_bounds();
        }
    }

    fn check_sub_mesh_vertices(&self, sub_meshes: &[SubMesh], vertex_count: u32) -> MeshResult<()> {
        for sub_mesh in sub_meshes {
            let max = self
                .indices
                .iter_range(sub_mesh.index_start, sub_mesh.index_count)
                .max();
            if let Some(max) = max {
                let vertex = sub_mesh.base_vertex as u64 + max as u64;
                if vertex >= vertex_count as u64 {
                    return Err(MeshError::IndexOutOfRange {
                        what: "sub-mesh vertex",
                        index: vertex,
                        limit: vertex_count as u64,
                    });
                }
            }
        }
        Ok(())
    }

    /// Check values about to be written at `range_start` against the sub-meshes
    /// covering them. Values that are themselves out of range are left to the
    /// index buffer to report.
    fn check_written_indices(
        &self,
        values: &[u32],
        range_start: u32,
        vertex_count: u32,
    ) -> MeshResult<()> {
        for sub_mesh in self.sub_meshes.iter() {
            for (k, &value) in values.iter().enumerate() {
                let position = range_start as u64 + k as u64;
                if position < sub_mesh.index_start as u64 || position >= sub_mesh.index_end() {
                    continue;
                }
                let vertex = sub_mesh.base_vertex as u64 + value as u64;
                if value < vertex_count && vertex >= vertex_count as u64 {
                    return Err(MeshError::IndexOutOfRange {
                        what: "sub-mesh vertex",
                        index: vertex,
                        limit: vertex_count as u64,
                    });
                }
            }
        }
        Ok(())
    }
}
