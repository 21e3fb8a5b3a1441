//! Mesh generators for common shapes.
//!
//! Each generator returns a ready [`Mesh`] with a single triangle-list
//! sub-mesh, 32-bit indices and recalculated bounds.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::error::{MeshError, MeshResult};
use crate::flags::MeshUpdateFlags;
use crate::index::IndexFormat;
use crate::layout::VertexLayout;
use crate::lod::LodLevel;
use crate::mesh::{Mesh, MeshDescriptor};
use crate::submesh::{PrimitiveTopology, SubMesh};

/// Vertex matching [`VertexLayout::position_normal_uv`].
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PnuVertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// Vertex matching [`VertexLayout::position_uv`].
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PuVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

/// Generate a quad on the XY plane, centered at the origin.
///
/// UV coordinates go from (0,0) at top-left to (1,1) at bottom-right.
pub fn generate_quad(half_width: f32, half_height: f32) -> MeshResult<Mesh> {
    let vertices = [
        PuVertex {
            position: [-half_width, -half_height, 0.0],
            uv: [0.0, 1.0],
        },
        PuVertex {
            position: [half_width, -half_height, 0.0],
            uv: [1.0, 1.0],
        },
        PuVertex {
            position: [half_width, half_height, 0.0],
            uv: [1.0, 0.0],
        },
        PuVertex {
            position: [-half_width, half_height, 0.0],
            uv: [0.0, 0.0],
        },
    ];
    let indices: [u32; 6] = [0, 1, 2, 2, 3, 0];

    build_mesh(
        VertexLayout::position_uv(),
        bytemuck::cast_slice(&vertices),
        vertices.len() as u32,
        &indices,
        "quad",
    )
}

/// Generate a UV sphere.
///
/// `segments` are longitudinal divisions (around the equator), `rings` are
/// latitudinal divisions (pole to pole). Uses the `position_normal_uv`
/// layout; the vertex count is `(rings + 1) * (segments + 1)`.
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> MeshResult<Mesh> {
    check_sphere_grid(segments, rings)?;
    let vertices = sphere_vertices(radius, segments, rings);
    let indices = sphere_indices(segments, rings, 1);
    build_mesh(
        VertexLayout::position_normal_uv(),
        bytemuck::cast_slice(&vertices),
        vertices.len() as u32,
        &indices,
        "sphere",
    )
}

/// Generate a UV sphere with `lod_count` levels of detail.
///
/// All levels share the full-resolution vertex grid. Level `k` skips rings
/// and segments with a step of `2^k`, always keeping both poles and the seam.
/// The index buffer holds every level back to back and the single sub-mesh
/// spans all of them; draw a level through
/// [`Mesh::get_indices`](crate::Mesh::get_indices) with `Some(level)`.
pub fn generate_sphere_with_lods(
    radius: f32,
    segments: u32,
    rings: u32,
    lod_count: u32,
) -> MeshResult<Mesh> {
    check_sphere_grid(segments, rings)?;
    if lod_count == 0 || lod_count > 16 {
        return Err(MeshError::InvalidArgument(format!(
            "LOD count must be in 1..=16, got {lod_count}"
        )));
    }
    let coarsest = 1u32 << (lod_count - 1);
    if grid_samples(segments, coarsest).len() < 4 || grid_samples(rings, coarsest).len() < 3 {
        return Err(MeshError::InvalidArgument(format!(
            "{segments}x{rings} sphere is too coarse for {lod_count} LOD levels"
        )));
    }

    let vertices = sphere_vertices(radius, segments, rings);
    let mut indices = Vec::new();
    let mut ranges = Vec::with_capacity(lod_count as usize);
    for level in 0..lod_count {
        let start = indices.len();
        indices.extend(sphere_indices(segments, rings, 1 << level));
        ranges.push((start, indices.len() - start));
    }
    if u32::try_from(indices.len()).is_err() {
        return Err(MeshError::InvalidArgument(format!(
            "{lod_count} LOD levels of a {segments}x{rings} sphere need {} indices",
            indices.len()
        )));
    }

    let mut mesh = build_mesh(
        VertexLayout::position_normal_uv(),
        bytemuck::cast_slice(&vertices),
        vertices.len() as u32,
        &indices,
        "sphere_lod",
    )?;
    let levels = ranges
        .into_iter()
        .enumerate()
        .map(|(level, (start, count))| LodLevel::new(0, level as u32, start as u32, count as u32))
        .collect();
    mesh.set_lods(0, levels)?;
    Ok(mesh)
}

fn check_sphere_grid(segments: u32, rings: u32) -> MeshResult<()> {
    if segments < 3 || rings < 2 {
        return Err(MeshError::InvalidArgument(format!(
            "sphere needs at least 3 segments and 2 rings, got {segments}x{rings}"
        )));
    }
    let vertex_count = (segments as u64 + 1) * (rings as u64 + 1);
    let index_count = segments as u64 * rings as u64 * 6;
    if vertex_count > u32::MAX as u64 || index_count > u32::MAX as u64 {
        return Err(MeshError::InvalidArgument(format!(
            "{segments}x{rings} sphere needs {vertex_count} vertices and {index_count} \
             indices, more than 32-bit indices can address"
        )));
    }
    Ok(())
}

fn sphere_vertices(radius: f32, segments: u32, rings: u32) -> Vec<PnuVertex> {
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let x = sin_theta * phi.cos();
            let y = cos_theta;
            let z = sin_theta * phi.sin();

            vertices.push(PnuVertex {
                position: [x * radius, y * radius, z * radius],
                normal: [x, y, z],
                uv: [segment as f32 / segments as f32, ring as f32 / rings as f32],
            });
        }
    }
    vertices
}

/// Triangle indices over the vertex grid, visiting every `step`-th ring and segment.
fn sphere_indices(segments: u32, rings: u32, step: u32) -> Vec<u32> {
    let ring_samples = grid_samples(rings, step);
    let segment_samples = grid_samples(segments, step);
    let row = segments + 1;

    let mut indices = Vec::new();
    for rw in ring_samples.windows(2) {
        for sw in segment_samples.windows(2) {
            let current = rw[0] * row + sw[0];
            let current_next = rw[0] * row + sw[1];
            let below = rw[1] * row + sw[0];
            let below_next = rw[1] * row + sw[1];

            indices.extend_from_slice(&[current, below, current_next]);
            indices.extend_from_slice(&[current_next, below, below_next]);
        }
    }
    indices
}

/// `0, step, 2*step, ...` up to and always including `n`.
fn grid_samples(n: u32, step: u32) -> Vec<u32> {
    let mut samples: Vec<u32> = (0..=n).step_by(step.max(1) as usize).collect();
    if samples.last() != Some(&n) {
        samples.push(n);
    }
    samples
}

fn build_mesh(
    layout: Arc<VertexLayout>,
    vertex_bytes: &[u8],
    vertex_count: u32,
    indices: &[u32],
    label: &str,
) -> MeshResult<Mesh> {
    let index_count = indices.len() as u32;
    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(layout)
            .with_vertex_count(vertex_count)
            .with_indices(IndexFormat::Uint32, index_count)
            .with_label(label),
    )?;
    mesh.write_stream(0, vertex_bytes, 0, MeshUpdateFlags::empty())?;
    mesh.write_indices(indices, 0, index_count, MeshUpdateFlags::empty())?;
    mesh.set_sub_meshes(
        vec![SubMesh::new(PrimitiveTopology::TriangleList, 0, index_count, 0)],
        MeshUpdateFlags::RECALCULATE_BOUNDS,
    )?;
    log::debug!("Generated {label}: {vertex_count} vertices, {index_count} indices");
    Ok(mesh)
}
