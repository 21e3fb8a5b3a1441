//! Shared helpers for mesh integration tests.

#![allow(dead_code)]

use redlilium_mesh::{
    ComponentClass, IndexFormat, Mesh, MeshDescriptor, MeshError, MeshResult, MeshSnapshot,
    MeshUpdateFlags, PrimitiveTopology, SubMesh, UploadTarget, VertexAttributeSemantic,
    VertexLayout, VertexValue,
};
use redlilium_mesh::math::Vec3;

/// Install a test logger once; later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A single triangle with positions and normals, fully indexed.
pub fn triangle() -> Mesh {
    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(VertexLayout::position_normal())
            .with_vertex_count(3)
            .with_indices(IndexFormat::Uint16, 3)
            .with_label("triangle"),
    )
    .unwrap();
    mesh.write_attribute_all(
        VertexAttributeSemantic::Position,
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
    )
    .unwrap();
    mesh.write_attribute_all(VertexAttributeSemantic::Normal, &[Vec3::z(); 3])
        .unwrap();
    mesh.write_indices(&[0, 1, 2], 0, 3, MeshUpdateFlags::empty())
        .unwrap();
    mesh.set_sub_meshes(
        vec![SubMesh::new(PrimitiveTopology::TriangleList, 0, 3, 0)],
        MeshUpdateFlags::empty(),
    )
    .unwrap();
    mesh
}

/// A grid of `n x n` quads (two triangles each) on the XY plane.
pub fn grid(n: u32) -> Mesh {
    let row = n + 1;
    let vertex_count = row * row;
    let positions: Vec<Vec3> = (0..vertex_count)
        .map(|i| Vec3::new((i % row) as f32, (i / row) as f32, 0.0))
        .collect();
    let mut indices = Vec::new();
    for y in 0..n {
        for x in 0..n {
            let i = y * row + x;
            indices.extend_from_slice(&[i, i + 1, i + row, i + 1, i + row + 1, i + row]);
        }
    }

    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(VertexLayout::position_only())
            .with_vertex_count(vertex_count)
            .with_indices(IndexFormat::Uint32, indices.len() as u32),
    )
    .unwrap();
    mesh.write_attribute_all(VertexAttributeSemantic::Position, &positions)
        .unwrap();
    mesh.write_indices(&indices, 0, indices.len() as u32, MeshUpdateFlags::empty())
        .unwrap();
    mesh
}

/// Read an attribute of any supported shape as a flat list of widened components.
pub fn read_components(mesh: &Mesh, semantic: VertexAttributeSemantic) -> Vec<f64> {
    let attribute = *mesh.vertex_layout().get_attribute(semantic).unwrap();
    match (attribute.format.class(), attribute.dimension) {
        (ComponentClass::Float, 1) => flatten::<f32>(mesh, semantic),
        (ComponentClass::Float, 2) => flatten::<[f32; 2]>(mesh, semantic),
        (ComponentClass::Float, 3) => flatten::<[f32; 3]>(mesh, semantic),
        (ComponentClass::Float, 4) => flatten::<[f32; 4]>(mesh, semantic),
        (ComponentClass::Uint, 4) => flatten::<[u32; 4]>(mesh, semantic),
        (ComponentClass::Sint, 4) => flatten::<[i32; 4]>(mesh, semantic),
        (class, dimension) => panic!("unsupported shape {class:?}x{dimension}"),
    }
}

fn flatten<T: VertexValue>(mesh: &Mesh, semantic: VertexAttributeSemantic) -> Vec<f64> {
    mesh.read_attribute::<T>(semantic)
        .unwrap()
        .iter()
        .flat_map(|v| (0..T::DIMENSION as usize).map(move |i| v.component(i)))
        .collect()
}

/// Upload target that copies everything it receives.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    pub uploads: usize,
    pub label: Option<String>,
    pub vertex_streams: Vec<Vec<u8>>,
    pub index_format: Option<IndexFormat>,
    pub index_data: Vec<u8>,
    pub sub_meshes: Vec<SubMesh>,
    pub lod_counts: Vec<u32>,
    pub vertex_generation: u64,
}

impl UploadTarget for RecordingTarget {
    fn upload(&mut self, snapshot: &MeshSnapshot<'_>) -> MeshResult<()> {
        self.uploads += 1;
        self.label = snapshot.label.map(str::to_owned);
        self.vertex_streams = snapshot.vertex_streams.iter().map(|s| s.to_vec()).collect();
        self.index_format = Some(snapshot.index_format);
        self.index_data = snapshot.index_data.to_vec();
        self.sub_meshes = snapshot.sub_meshes.to_vec();
        self.lod_counts = (0..snapshot.sub_meshes.len() as u32)
            .map(|i| snapshot.lods.level_count(i).unwrap_or(0))
            .collect();
        self.vertex_generation = snapshot.vertex_generation;
        Ok(())
    }
}

/// Upload target that always rejects the snapshot.
pub struct FailingTarget;

impl UploadTarget for FailingTarget {
    fn upload(&mut self, _snapshot: &MeshSnapshot<'_>) -> MeshResult<()> {
        Err(MeshError::Upload("device lost".to_string()))
    }
}
