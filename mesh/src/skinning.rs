//! Bone weights and bind poses.
//!
//! Weights are stored in a compact variable-length form: `bones_per_vertex[v]`
//! says how many consecutive entries of the weight array belong to vertex `v`.
//! Weight sums are expected to be close to 1.0, but this is only reported
//! through the log and [`SkinningData::unnormalized_vertices`].

use crate::error::{MeshError, MeshResult};
use crate::math::Mat4;

/// Weight tolerance used when reporting unnormalized vertices on attach.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-3;

/// Influence of one bone on one vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoneWeight {
    /// Index into the bind pose array.
    pub bone_index: u32,
    /// Influence weight.
    pub weight: f32,
}

impl BoneWeight {
    /// Create a bone weight.
    pub fn new(bone_index: u32, weight: f32) -> Self {
        Self { bone_index, weight }
    }
}

/// Skinning arrays attached to a mesh.
#[derive(Debug, Clone, Default)]
pub struct SkinningData {
    bones_per_vertex: Vec<u8>,
    weights: Vec<BoneWeight>,
    bind_poses: Vec<Mat4>,
    /// First weight of each vertex.
    offsets: Vec<u32>,
}

impl SkinningData {
    /// Create empty skinning data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all skinning arrays.
    ///
    /// Fails with [`MeshError::CountMismatch`] if `bones_per_vertex` does not
    /// hold one entry per vertex, and [`MeshError::WeightCountMismatch`] if the
    /// weight array length differs from the sum of `bones_per_vertex`. On error
    /// the previous data is kept.
    pub fn attach(
        &mut self,
        bones_per_vertex: Vec<u8>,
        weights: Vec<BoneWeight>,
        bind_poses: Vec<Mat4>,
        vertex_count: u32,
    ) -> MeshResult<()> {
        if bones_per_vertex.len() != vertex_count as usize {
            return Err(MeshError::CountMismatch {
                what: "bones per vertex",
                expected: vertex_count as u64,
                actual: bones_per_vertex.len() as u64,
            });
        }
        let total: u64 = bones_per_vertex.iter().map(|&n| n as u64).sum();
        if total != weights.len() as u64 {
            return Err(MeshError::WeightCountMismatch {
                expected: total,
                actual: weights.len() as u64,
            });
        }

        let mut offsets = Vec::with_capacity(bones_per_vertex.len());
        let mut cursor = 0u32;
        for &n in &bones_per_vertex {
            offsets.push(cursor);
            cursor += n as u32;
        }

        self.bones_per_vertex = bones_per_vertex;
        self.weights = weights;
        self.bind_poses = bind_poses;
        self.offsets = offsets;

        let unnormalized = self.unnormalized_vertices(WEIGHT_SUM_TOLERANCE);
        if !unnormalized.is_empty() {
            log::warn!(
                "{} of {} vertices have bone weights not summing to 1.0 (first: vertex {})",
                unnormalized.len(),
                vertex_count,
                unnormalized[0]
            );
        }
        if !self.bind_poses.is_empty() {
            let pose_count = self.bind_poses.len() as u32;
            if let Some(w) = self.weights.iter().find(|w| w.bone_index >= pose_count) {
                log::warn!(
                    "Bone index {} has no bind pose ({} bind poses attached)",
                    w.bone_index,
                    pose_count
                );
            }
        }
        log::debug!(
            "Skinning attached: {} vertices, {} weights, {} bind poses",
            vertex_count,
            self.weights.len(),
            self.bind_poses.len()
        );
        Ok(())
    }

    /// Replace only the bind poses.
    pub fn set_bind_poses(&mut self, bind_poses: Vec<Mat4>) {
        self.bind_poses = bind_poses;
    }

    /// Drop all three arrays.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            log::debug!("Skinning data cleared");
        }
        self.bones_per_vertex.clear();
        self.weights.clear();
        self.bind_poses.clear();
        self.offsets.clear();
    }

    /// Whether no skinning arrays are held.
    pub fn is_empty(&self) -> bool {
        self.bones_per_vertex.is_empty() && self.weights.is_empty() && self.bind_poses.is_empty()
    }

    /// Whether per-vertex bone weights are attached.
    pub fn has_bone_weights(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Number of bones influencing each vertex.
    pub fn bones_per_vertex(&self) -> &[u8] {
        &self.bones_per_vertex
    }

    /// All weights, grouped by vertex.
    pub fn weights(&self) -> &[BoneWeight] {
        &self.weights
    }

    /// Raw weight bytes (`bone_index: u32, weight: f32` pairs).
    pub fn weights_as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.weights)
    }

    /// Bind poses.
    pub fn bind_poses(&self) -> &[Mat4] {
        &self.bind_poses
    }

    /// Weights of one vertex.
    pub fn weights_for_vertex(&self, vertex: u32) -> MeshResult<&[BoneWeight]> {
        let v = vertex as usize;
        let (Some(&start), Some(&count)) = (self.offsets.get(v), self.bones_per_vertex.get(v))
        else {
            return Err(MeshError::IndexOutOfRange {
                what: "vertex",
                index: vertex as u64,
                limit: self.bones_per_vertex.len() as u64,
            });
        };
        let start = start as usize;
        Ok(&self.weights[start..start + count as usize])
    }

    /// Largest number of bones influencing any vertex.
    pub fn max_bones_per_vertex(&self) -> u8 {
        self.bones_per_vertex.iter().copied().max().unwrap_or(0)
    }

    /// Vertices whose weights sum further than `tolerance` from 1.0.
    ///
    /// Vertices with no influences are skipped.
    pub fn unnormalized_vertices(&self, tolerance: f32) -> Vec<u32> {
        (0..self.bones_per_vertex.len() as u32)
            .filter(|&v| {
                let weights = self.weights_for_vertex(v).unwrap_or(&[]);
                if weights.is_empty() {
                    return false;
                }
                let sum: f32 = weights.iter().map(|w| w.weight).sum();
                (sum - 1.0).abs() > tolerance
            })
            .collect()
    }
}
