//! Integration tests for the mesh crate.
//!
//! These exercise the public API end to end: layouts, typed attribute access,
//! index validation, sub-meshes, LODs, skinning, blend shapes and upload.

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{FailingTarget, RecordingTarget, grid, init_logger, read_components, triangle};
use redlilium_mesh::math::{Mat4, Vec3};
use redlilium_mesh::{
    Aabb, BoneWeight, IndexBuffer, IndexFormat, LodLevel, LodSelectionCurve, Mesh,
    MeshDescriptor, MeshError, MeshUpdateFlags, OverlapPolicy, PrimitiveTopology, SubMesh,
    VertexAttribute, VertexAttributeFormat, VertexAttributeSemantic, VertexLayout,
};

fn every_semantic_layout() -> Arc<VertexLayout> {
    let mut attributes = vec![
        VertexAttribute::position(0),
        VertexAttribute::normal(0),
        VertexAttribute::tangent(0),
        VertexAttribute::color(0),
        VertexAttribute::weights(0),
        VertexAttribute::joints(0),
    ];
    for set in 0..8 {
        let semantic = VertexAttributeSemantic::texcoord(set).unwrap();
        attributes.push(VertexAttribute::new(
            semantic,
            VertexAttributeFormat::Float32,
            2,
            0,
            0,
        ));
    }
    Arc::new(VertexLayout::define_packed(attributes).unwrap())
}

// ============================================================================
// Vertex data
// ============================================================================

#[rstest]
#[case::position(VertexAttributeSemantic::Position)]
#[case::normal(VertexAttributeSemantic::Normal)]
#[case::tangent(VertexAttributeSemantic::Tangent)]
#[case::color(VertexAttributeSemantic::Color)]
#[case::texcoord0(VertexAttributeSemantic::TexCoord0)]
#[case::texcoord7(VertexAttributeSemantic::TexCoord7)]
#[case::weights(VertexAttributeSemantic::Weights)]
#[case::joints(VertexAttributeSemantic::Joints)]
fn test_new_vertices_read_as_zero(#[case] semantic: VertexAttributeSemantic) {
    init_logger();
    let mesh = Mesh::from_descriptor(
        MeshDescriptor::new(every_semantic_layout()).with_vertex_count(5),
    )
    .unwrap();

    let attribute = mesh.vertex_layout().get_attribute(semantic).unwrap();
    let components = read_components(&mesh, semantic);
    assert_eq!(components.len(), 5 * attribute.dimension as usize);
    assert!(components.iter().all(|&c| c == 0.0));
}

#[rstest]
#[case::float32(VertexAttributeFormat::Float32, 0.0)]
#[case::float16(VertexAttributeFormat::Float16, 1e-3)]
#[case::unorm8(VertexAttributeFormat::Unorm8, 1.0 / 255.0)]
#[case::unorm16(VertexAttributeFormat::Unorm16, 1.0 / 65535.0)]
#[case::snorm8(VertexAttributeFormat::Snorm8, 1.0 / 127.0)]
#[case::snorm16(VertexAttributeFormat::Snorm16, 1.0 / 32767.0)]
fn test_float_round_trip_within_precision(
    #[case] format: VertexAttributeFormat,
    #[case] tolerance: f32,
) {
    init_logger();
    let layout = Arc::new(
        VertexLayout::define_packed([VertexAttribute::new(
            VertexAttributeSemantic::Color,
            format,
            4,
            0,
            0,
        )])
        .unwrap(),
    );
    let mut mesh =
        Mesh::from_descriptor(MeshDescriptor::new(layout).with_vertex_count(2)).unwrap();
    let written = [[1.0f32, 0.5, 0.25, 0.0], [0.1, 0.9, 0.75, 0.333]];
    mesh.write_attribute_all(VertexAttributeSemantic::Color, &written)
        .unwrap();

    let read: Vec<[f32; 4]> = mesh.read_attribute(VertexAttributeSemantic::Color).unwrap();
    for (w, r) in written.iter().flatten().zip(read.iter().flatten()) {
        assert!((w - r).abs() <= tolerance, "{format:?}: wrote {w}, read {r}");
    }
}

#[rstest]
#[case::uint8(VertexAttributeFormat::Uint8, 300, 255)]
#[case::uint16(VertexAttributeFormat::Uint16, 70_000, 65_535)]
#[case::uint32(VertexAttributeFormat::Uint32, 70_000, 70_000)]
fn test_integer_values_clamp_to_format(
    #[case] format: VertexAttributeFormat,
    #[case] written: u32,
    #[case] expected: u32,
) {
    let layout = Arc::new(
        VertexLayout::define_packed([VertexAttribute::new(
            VertexAttributeSemantic::Joints,
            format,
            4,
            0,
            0,
        )])
        .unwrap(),
    );
    let mut mesh =
        Mesh::from_descriptor(MeshDescriptor::new(layout).with_vertex_count(1)).unwrap();
    mesh.write_attribute(VertexAttributeSemantic::Joints, &[[written, 1, 2, 3]], 0, 1)
        .unwrap();
    let read: Vec<[u32; 4]> = mesh.read_attribute(VertexAttributeSemantic::Joints).unwrap();
    assert_eq!(read, vec![[expected, 1, 2, 3]]);
}

#[test]
fn test_multi_stream_layout() {
    init_logger();
    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(VertexLayout::animated_pbr()).with_vertex_count(4),
    )
    .unwrap();
    assert_eq!(mesh.vertex_buffer().stream_count(), 3);

    mesh.write_attribute_all(VertexAttributeSemantic::Position, &[Vec3::new(1.0, 2.0, 3.0); 4])
        .unwrap();
    mesh.write_attribute(VertexAttributeSemantic::Joints, &[[1u32, 2, 3, 4]], 2, 1)
        .unwrap();

    let joints: Vec<[u32; 4]> = mesh.read_attribute(VertexAttributeSemantic::Joints).unwrap();
    assert_eq!(joints[2], [1, 2, 3, 4]);
    assert_eq!(joints[0], [0; 4]);
    let positions: Vec<Vec3> = mesh.read_attribute(VertexAttributeSemantic::Position).unwrap();
    assert!(positions.iter().all(|p| *p == Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_attribute_view_goes_stale_on_index_independent_mutation() {
    let mut mesh = triangle();
    let view = mesh.attribute_view(VertexAttributeSemantic::Normal).unwrap();
    let index_view = mesh.index_view();
    assert_eq!(mesh.resolve_attribute(&view).unwrap().len(), 3);

    // Index writes leave vertex views valid and vice versa.
    mesh.write_indices(&[2, 1, 0], 0, 3, MeshUpdateFlags::empty())
        .unwrap();
    assert!(mesh.resolve_attribute(&view).is_ok());
    assert!(matches!(
        mesh.resolve_indices(&index_view),
        Err(MeshError::StaleView { .. })
    ));

    mesh.write_attribute(VertexAttributeSemantic::Normal, &[Vec3::x()], 0, 1)
        .unwrap();
    assert!(matches!(
        mesh.resolve_attribute(&view),
        Err(MeshError::StaleView { .. })
    ));
}

// ============================================================================
// Indices
// ============================================================================

#[rstest]
#[case::empty(0)]
#[case::single(1)]
#[case::triangle(3)]
#[case::u16_limit(65_536)]
fn test_index_past_vertex_count_rejected(#[case] vertex_count: u32) {
    init_logger();
    let index_count = if vertex_count == 0 { 0 } else { 3 };
    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(VertexLayout::position_only())
            .with_vertex_count(vertex_count)
            .with_indices(IndexFormat::Uint16, index_count),
    )
    .unwrap();

    let err = mesh
        .write_indices(&[vertex_count], 0, 1, MeshUpdateFlags::empty())
        .unwrap_err();
    assert_eq!(
        err,
        MeshError::IndexOutOfRange {
            what: "vertex index",
            index: vertex_count as u64,
            limit: vertex_count as u64,
        }
    );
}

#[test]
fn test_standalone_index_buffer_with_no_vertices() {
    let mut buffer = IndexBuffer::new();
    buffer.set_params(4, IndexFormat::Uint32).unwrap();
    assert!(matches!(
        buffer.write(&[0], 0, 1, 0),
        Err(MeshError::IndexOutOfRange { .. })
    ));
}

#[test]
fn test_u16_overflow_reported_at_write() {
    let mut mesh = Mesh::from_descriptor(
        MeshDescriptor::new(VertexLayout::position_only())
            .with_vertex_count(70_000)
            .with_indices(IndexFormat::Uint16, 3),
    )
    .unwrap();
    assert_eq!(
        mesh.write_indices(&[0, 1, 69_999], 0, 3, MeshUpdateFlags::empty())
            .unwrap_err(),
        MeshError::IndexOverflow(69_999)
    );

    mesh.set_index_buffer_params(3, IndexFormat::Uint32).unwrap();
    mesh.write_indices(&[0, 1, 69_999], 0, 3, MeshUpdateFlags::empty())
        .unwrap();
    assert_eq!(mesh.index_buffer().to_vec(), vec![0, 1, 69_999]);
}

// ============================================================================
// Sub-meshes
// ============================================================================

#[test]
fn test_position_normal_triangle_scenario() {
    init_logger();
    let mut mesh = triangle();
    assert_eq!(
        mesh.sub_mesh(0).unwrap(),
        SubMesh {
            topology: PrimitiveTopology::TriangleList,
            index_start: 0,
            index_count: 3,
            base_vertex: 0,
            bounds_hint: None,
        }
    );
    assert!(matches!(
        mesh.write_indices(&[0, 1, 3], 0, 3, MeshUpdateFlags::empty()),
        Err(MeshError::IndexOutOfRange { .. })
    ));
    assert_eq!(mesh.get_indices(0, false, None).unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_sub_mesh_past_index_buffer() {
    let mut mesh = grid(2);
    let err = mesh
        .set_sub_meshes(
            vec![SubMesh::new(PrimitiveTopology::TriangleList, 12, 24, 0)],
            MeshUpdateFlags::empty(),
        )
        .unwrap_err();
    assert!(matches!(err, MeshError::InvalidRange(_)));
    assert_eq!(mesh.sub_mesh_count(), 0);
    assert!(matches!(
        mesh.sub_mesh(0),
        Err(MeshError::IndexOutOfRange { .. })
    ));
}

#[rstest]
#[case::allow(OverlapPolicy::Allow, true)]
#[case::disjoint(OverlapPolicy::Disjoint, false)]
fn test_overlap_policy(#[case] policy: OverlapPolicy, #[case] accepted: bool) {
    let mut mesh = grid(2);
    mesh.set_overlap_policy(policy);
    let result = mesh.set_sub_meshes(
        vec![
            SubMesh::new(PrimitiveTopology::TriangleList, 0, 24, 0),
            SubMesh::new(PrimitiveTopology::TriangleList, 12, 12, 0),
        ],
        MeshUpdateFlags::empty(),
    );
    assert_eq!(result.is_ok(), accepted);
}

#[test]
fn test_sub_mesh_bounds() {
    let mut mesh = grid(2);
    mesh.set_sub_meshes(
        vec![
            SubMesh::new(PrimitiveTopology::TriangleList, 0, 6, 0),
            SubMesh::new(PrimitiveTopology::TriangleList, 18, 6, 0),
        ],
        MeshUpdateFlags::empty(),
    )
    .unwrap();

    assert_eq!(
        mesh.compute_sub_mesh_bounds(0).unwrap(),
        Some(Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0)))
    );
    assert_eq!(
        mesh.compute_sub_mesh_bounds(1).unwrap(),
        Some(Aabb::new(Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 0.0)))
    );
    assert_eq!(mesh.bounds(), None);

    mesh.recalculate_bounds().unwrap();
    assert_eq!(
        mesh.bounds(),
        Some(Aabb::new(Vec3::zeros(), Vec3::new(2.0, 2.0, 0.0)))
    );
}

// ============================================================================
// LODs
// ============================================================================

#[test]
fn test_lod_escaping_sub_mesh_rejected() {
    init_logger();
    let mut mesh = grid(2);
    mesh.set_sub_meshes(
        vec![
            SubMesh::new(PrimitiveTopology::TriangleList, 0, 12, 0),
            SubMesh::new(PrimitiveTopology::TriangleList, 12, 12, 0),
        ],
        MeshUpdateFlags::empty(),
    )
    .unwrap();

    let err = mesh
        .set_lods(1, vec![LodLevel::new(1, 0, 6, 12)])
        .unwrap_err();
    assert!(matches!(err, MeshError::InvalidRange(_)));
    assert!(matches!(
        mesh.set_lods(2, vec![]),
        Err(MeshError::IndexOutOfRange { .. })
    ));

    mesh.set_lods(1, vec![LodLevel::new(1, 0, 12, 12), LodLevel::new(1, 1, 12, 6)])
        .unwrap();
    assert_eq!(mesh.lod_count(1).unwrap(), 2);
    assert_eq!(mesh.lod_count(0).unwrap(), 0);
}

#[rstest]
#[case::near(0.0, 0)]
#[case::on_first_threshold(10.0, 0)]
#[case::between(15.0, 1)]
#[case::far(1_000.0, 2)]
#[case::nan(f32::NAN, 0)]
fn test_lod_selection(#[case] metric: f32, #[case] expected: u32) {
    let mut mesh = grid(2);
    mesh.set_sub_meshes(
        vec![SubMesh::new(PrimitiveTopology::TriangleList, 0, 24, 0)],
        MeshUpdateFlags::empty(),
    )
    .unwrap();
    mesh.set_lods(
        0,
        vec![
            LodLevel::new(0, 0, 0, 24),
            LodLevel::new(0, 1, 0, 12),
            LodLevel::new(0, 2, 0, 6),
        ],
    )
    .unwrap();
    mesh.set_lod_selection_curve(LodSelectionCurve::new(vec![10.0, 20.0, 40.0]).unwrap());

    assert_eq!(mesh.select_lod(0, metric).unwrap(), expected);
}

#[test]
fn test_lod_selection_from_slope_bias() {
    let mut mesh = grid(1);
    mesh.set_sub_meshes(
        vec![SubMesh::new(PrimitiveTopology::TriangleList, 0, 6, 0)],
        MeshUpdateFlags::empty(),
    )
    .unwrap();
    mesh.set_lods(0, vec![LodLevel::new(0, 0, 0, 6), LodLevel::new(0, 1, 0, 3)])
        .unwrap();
    mesh.set_lod_selection_curve(LodSelectionCurve::from_slope_bias(0.1, 0.0, 2).unwrap());

    let distance = |d: &f32| *d;
    assert_eq!(mesh.select_lod_for(0, &distance, &5.0f32).unwrap(), 0);
    assert_eq!(mesh.select_lod_for(0, &distance, &50.0f32).unwrap(), 1);
}

// ============================================================================
// Skinning and blend shapes
// ============================================================================

#[test]
fn test_resize_empties_skinning() {
    init_logger();
    let mut mesh = triangle();
    mesh.attach_skinning(
        vec![2, 1, 1],
        vec![
            BoneWeight::new(0, 0.5),
            BoneWeight::new(1, 0.5),
            BoneWeight::new(1, 1.0),
            BoneWeight::new(0, 1.0),
        ],
        vec![Mat4::identity(); 2],
    )
    .unwrap();
    assert_eq!(mesh.skinning().weights_for_vertex(0).unwrap().len(), 2);

    mesh.set_vertex_buffer_params(6, VertexLayout::position_normal(), MeshUpdateFlags::empty())
        .unwrap();
    assert!(mesh.skinning().is_empty());
    assert!(mesh.skinning().bones_per_vertex().is_empty());
    assert!(mesh.skinning().bind_poses().is_empty());
}

#[test]
fn test_skinning_count_checks() {
    let mut mesh = triangle();
    assert!(matches!(
        mesh.attach_skinning(vec![1, 1], vec![BoneWeight::default(); 2], vec![]),
        Err(MeshError::CountMismatch { .. })
    ));
    assert!(matches!(
        mesh.attach_skinning(vec![1, 1, 1], vec![BoneWeight::default(); 2], vec![]),
        Err(MeshError::WeightCountMismatch {
            expected: 3,
            actual: 2
        })
    ));
}

#[test]
fn test_blend_shapes_follow_vertex_count() {
    let mut mesh = triangle();
    let normals = Some(vec![Vec3::zeros(); 3]);
    mesh.add_blend_shape_frame("inflate", 100.0, vec![Vec3::z(); 3], normals, None)
        .unwrap();
    assert!(matches!(
        mesh.add_blend_shape_frame("inflate", 50.0, vec![Vec3::z(); 3], None, None),
        Err(MeshError::InvalidArgument(_))
    ));
    assert!(matches!(
        mesh.add_blend_shape_frame("deflate", 50.0, vec![Vec3::z(); 2], None, None),
        Err(MeshError::CountMismatch { .. })
    ));
    assert_eq!(mesh.blend_shapes().count(), 1);

    mesh.set_vertex_buffer_params(4, VertexLayout::position_normal(), MeshUpdateFlags::empty())
        .unwrap();
    assert!(mesh.blend_shapes().is_empty());
}

// ============================================================================
// Whole mesh
// ============================================================================

#[test]
fn test_upload_snapshot() {
    init_logger();
    let mut mesh = triangle();
    mesh.recalculate_bounds().unwrap();

    let mut target = RecordingTarget::default();
    mesh.upload(&mut target).unwrap();

    assert_eq!(target.uploads, 1);
    assert_eq!(target.label.as_deref(), Some("triangle"));
    assert_eq!(target.vertex_streams.len(), 1);
    assert_eq!(target.vertex_streams[0].len(), 3 * 24);
    assert_eq!(target.index_format, Some(IndexFormat::Uint16));
    assert_eq!(target.index_data, bytemuck::cast_slice::<u16, u8>(&[0, 1, 2]));
    assert_eq!(target.sub_meshes.len(), 1);
    assert!(target.sub_meshes[0].bounds_hint.is_some());
    assert_eq!(target.lod_counts, vec![0]);
    assert_eq!(target.vertex_generation, mesh.vertex_buffer().generation());
}

#[test]
fn test_upload_failure_propagates() {
    let mesh = triangle();
    assert_eq!(
        mesh.upload(&mut FailingTarget).unwrap_err(),
        MeshError::Upload("device lost".to_string())
    );
}

#[test]
fn test_clear_keeps_layout_on_request() {
    let mut mesh = triangle();
    mesh.clear(true);
    assert_eq!(mesh.vertex_count(), 0);
    assert_eq!(mesh.index_count(), 0);
    assert_eq!(mesh.sub_mesh_count(), 0);
    assert!(mesh.vertex_layout().has_semantic(VertexAttributeSemantic::Position));

    // The mesh is reusable after clearing.
    mesh.set_vertex_buffer_params(3, mesh.vertex_layout().clone(), MeshUpdateFlags::empty())
        .unwrap();
    mesh.set_index_buffer_params(3, IndexFormat::Uint16).unwrap();
    mesh.write_indices(&[0, 1, 2], 0, 3, MeshUpdateFlags::empty())
        .unwrap();

    mesh.clear(false);
    assert!(mesh.vertex_layout().is_empty());
}

#[test]
fn test_generated_sphere_lod_round_trip() {
    let mesh = redlilium_mesh::generators::generate_sphere_with_lods(1.0, 32, 16, 3).unwrap();
    let mut previous = usize::MAX;
    for level in 0..mesh.lod_count(0).unwrap() {
        let indices = mesh.get_indices(0, true, Some(level)).unwrap();
        assert!(indices.len() < previous);
        assert!(indices.iter().all(|&i| i < mesh.vertex_count()));
        previous = indices.len();
    }
}
