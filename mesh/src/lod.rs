//! Per-sub-mesh level-of-detail ranges and level selection.
//!
//! Each sub-mesh may carry an ordered list of [`LodLevel`]s, level 0 being
//! the most detailed. Every level is a contiguous index range inside its
//! sub-mesh's span, so coarser levels reuse the same vertex buffer.
//!
//! Selection maps a continuous metric to a level through a
//! [`LodSelectionCurve`]. The metric grows as less detail is needed (e.g.
//! viewer distance); callers with a coverage-style metric should invert it.

use crate::error::{MeshError, MeshResult};
use crate::submesh::SubMeshTable;

/// One level of detail of one sub-mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LodLevel {
    /// Sub-mesh this level belongs to.
    pub sub_mesh_index: u32,
    /// Position in the level list (0 = most detailed).
    pub level_index: u32,
    /// First index of the level's range.
    pub index_start: u32,
    /// Number of indices in the level's range.
    pub index_count: u32,
}

impl LodLevel {
    /// Create a level description.
    pub fn new(sub_mesh_index: u32, level_index: u32, index_start: u32, index_count: u32) -> Self {
        Self {
            sub_mesh_index,
            level_index,
            index_start,
            index_count,
        }
    }
}

/// Monotonic thresholds mapping a metric to a level index.
///
/// The selected level is the number of thresholds strictly below the metric.
/// A metric exactly on a threshold therefore picks the more detailed level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LodSelectionCurve {
    thresholds: Vec<f32>,
}

impl LodSelectionCurve {
    /// Build a curve from strictly increasing, finite thresholds.
    ///
    /// `thresholds[k]` is the metric at which level `k + 1` starts.
    pub fn new(thresholds: Vec<f32>) -> MeshResult<Self> {
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
            return Err(MeshError::InvalidArgument(format!("LOD threshold {bad} is not finite")));
        }
        if thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MeshError::InvalidArgument(
                "LOD thresholds must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { thresholds })
    }

    /// Build a linear curve where `level = metric * slope + bias`.
    ///
    /// Produces thresholds for `level_count` levels: level `k` starts where
    /// `metric * slope + bias` exceeds `k`.
    pub fn from_slope_bias(slope: f32, bias: f32, level_count: u32) -> MeshResult<Self> {
        if !(slope.is_finite() && slope > 0.0) || !bias.is_finite() {
            return Err(MeshError::InvalidArgument(format!(
                "LOD slope must be positive and finite (slope {slope}, bias {bias})"
            )));
        }
        let thresholds = (1..level_count.max(1))
            .map(|k| (k as f32 - bias) / slope)
            .collect();
        Self::new(thresholds)
    }

    /// The thresholds, in increasing order.
    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    /// Unclamped level for a metric. NaN selects level 0.
    pub fn level_for(&self, metric: f32) -> u32 {
        if metric.is_nan() {
            return 0;
        }
        self.thresholds.partition_point(|&t| t < metric) as u32
    }
}

/// Source of the selection metric for a viewer (camera, light, ...).
pub trait MetricProvider<V: ?Sized> {
    /// Metric for the given viewer state. Larger means less detail.
    fn metric(&self, viewer: &V) -> f32;
}

impl<V: ?Sized, F: Fn(&V) -> f32> MetricProvider<V> for F {
    fn metric(&self, viewer: &V) -> f32 {
        self(viewer)
    }
}

/// Level lists for every sub-mesh.
#[derive(Debug, Clone, Default)]
pub struct LodTable {
    levels: Vec<Vec<LodLevel>>,
}

impl LodTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every level list and size the table for `sub_mesh_count` sub-meshes.
    pub fn reset(&mut self, sub_mesh_count: usize) {
        self.levels.clear();
        self.levels.resize(sub_mesh_count, Vec::new());
    }

    /// Replace the level list of one sub-mesh.
    ///
    /// Fails with [`MeshError::IndexOutOfRange`] for an unknown sub-mesh,
    /// [`MeshError::InvalidRange`] if a level escapes the sub-mesh's span,
    /// and [`MeshError::InvalidArgument`] if a level is tagged with another
    /// sub-mesh or level index, or is not a whole number of primitives.
    pub fn set_lods(
        &mut self,
        sub_mesh_index: u32,
        levels: Vec<LodLevel>,
        sub_meshes: &SubMeshTable,
    ) -> MeshResult<()> {
        let sub_mesh = sub_meshes.get(sub_mesh_index as usize)?;

        for (position, level) in levels.iter().enumerate() {
            if level.sub_mesh_index != sub_mesh_index || level.level_index != position as u32 {
                return Err(MeshError::InvalidArgument(format!(
                    "level at position {position} is tagged sub-mesh {} level {}, \
                     expected sub-mesh {sub_mesh_index} level {position}",
                    level.sub_mesh_index, level.level_index
                )));
            }
            if !sub_mesh.contains_range(level.index_start, level.index_count) {
                return Err(MeshError::InvalidRange(format!(
                    "LOD {position} covers indices {}..{} outside sub-mesh \
                     {sub_mesh_index} ({}..{})",
                    level.index_start,
                    level.index_start as u64 + level.index_count as u64,
                    sub_mesh.index_start,
                    sub_mesh.index_end()
                )));
            }
            if let Some(per) = sub_mesh.topology.vertices_per_primitive() {
                if level.index_count % per != 0 {
                    return Err(MeshError::InvalidArgument(format!(
                        "LOD {position}: {} indices is not a multiple of {per}",
                        level.index_count
                    )));
                }
            }
        }

        if self.levels.len() != sub_meshes.len() {
            self.levels.resize(sub_meshes.len(), Vec::new());
        }
        log::debug!("Sub-mesh {sub_mesh_index}: {} LOD levels set", levels.len());
        self.levels[sub_mesh_index as usize] = levels;
        Ok(())
    }

    fn list(&self, sub_mesh_index: u32) -> MeshResult<&[LodLevel]> {
        self.levels
            .get(sub_mesh_index as usize)
            .map(|l| l.as_slice())
            .ok_or(MeshError::IndexOutOfRange {
                what: "sub-mesh",
                index: sub_mesh_index as u64,
                limit: self.levels.len() as u64,
            })
    }

    /// All levels of a sub-mesh, most detailed first.
    pub fn levels(&self, sub_mesh_index: u32) -> MeshResult<&[LodLevel]> {
        self.list(sub_mesh_index)
    }

    /// Number of levels of a sub-mesh.
    pub fn level_count(&self, sub_mesh_index: u32) -> MeshResult<u32> {
        Ok(self.list(sub_mesh_index)?.len() as u32)
    }

    /// One level of a sub-mesh.
    pub fn get(&self, sub_mesh_index: u32, level_index: u32) -> MeshResult<LodLevel> {
        let list = self.list(sub_mesh_index)?;
        list.get(level_index as usize)
            .copied()
            .ok_or(MeshError::IndexOutOfRange {
                what: "LOD level",
                index: level_index as u64,
                limit: list.len() as u64,
            })
    }

    /// Pick the level to draw for a metric, clamped to the defined levels.
    ///
    /// A sub-mesh without levels always selects level 0.
    pub fn select_level(
        &self,
        sub_mesh_index: u32,
        metric: f32,
        curve: &LodSelectionCurve,
    ) -> MeshResult<u32> {
        let count = self.list(sub_mesh_index)?.len() as u32;
        Ok(curve.level_for(metric).min(count.saturating_sub(1)))
    }

    /// Number of sub-mesh slots.
    pub fn sub_mesh_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submesh::{OverlapPolicy, PrimitiveTopology, SubMesh};

    fn table_with_sub_mesh(start: u32, count: u32, total: u32) -> SubMeshTable {
        let mut table = SubMeshTable::new();
        table
            .set_sub_meshes(
                vec![SubMesh::new(PrimitiveTopology::TriangleList, start, count, 0)],
                total,
                OverlapPolicy::Allow,
            )
            .unwrap();
        table
    }

    #[test]
    fn test_curve_validation() {
        assert!(LodSelectionCurve::new(vec![1.0, 2.0, 4.0]).is_ok());
        assert!(LodSelectionCurve::new(vec![1.0, 1.0]).is_err());
        assert!(LodSelectionCurve::new(vec![2.0, 1.0]).is_err());
        assert!(LodSelectionCurve::new(vec![f32::INFINITY]).is_err());
        assert!(LodSelectionCurve::from_slope_bias(0.0, 0.0, 3).is_err());
    }

    #[test]
    fn test_curve_ties_prefer_detail() {
        let curve = LodSelectionCurve::new(vec![10.0, 20.0]).unwrap();
        assert_eq!(curve.level_for(0.0), 0);
        assert_eq!(curve.level_for(10.0), 0);
        assert_eq!(curve.level_for(10.5), 1);
        assert_eq!(curve.level_for(20.0), 1);
        assert_eq!(curve.level_for(1000.0), 2);
        assert_eq!(curve.level_for(f32::NAN), 0);
    }

    #[test]
    fn test_curve_slope_bias() {
        let curve = LodSelectionCurve::from_slope_bias(0.5, 0.0, 3).unwrap();
        assert_eq!(curve.thresholds(), &[2.0, 4.0]);
        assert_eq!(curve.level_for(2.0), 0);
        assert_eq!(curve.level_for(3.0), 1);
        assert_eq!(curve.level_for(5.0), 2);

        let single = LodSelectionCurve::from_slope_bias(1.0, 0.0, 1).unwrap();
        assert!(single.thresholds().is_empty());
    }

    #[test]
    fn test_set_lods_within_sub_mesh() {
        let sub_meshes = table_with_sub_mesh(0, 12, 12);
        let mut lods = LodTable::new();
        lods.reset(sub_meshes.len());
        lods.set_lods(
            0,
            vec![LodLevel::new(0, 0, 0, 9), LodLevel::new(0, 1, 9, 3)],
            &sub_meshes,
        )
        .unwrap();
        assert_eq!(lods.level_count(0).unwrap(), 2);
        assert_eq!(lods.get(0, 1).unwrap(), LodLevel::new(0, 1, 9, 3));
        assert!(lods.get(0, 2).is_err());
    }

    #[test]
    fn test_set_lods_escaping_range() {
        let sub_meshes = table_with_sub_mesh(3, 6, 12);
        let mut lods = LodTable::new();
        lods.reset(sub_meshes.len());
        let err = lods
            .set_lods(0, vec![LodLevel::new(0, 0, 0, 6)], &sub_meshes)
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidRange(_)));
        let err = lods
            .set_lods(0, vec![LodLevel::new(0, 0, 6, 6)], &sub_meshes)
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidRange(_)));
        assert_eq!(lods.level_count(0).unwrap(), 0);
    }

    #[test]
    fn test_set_lods_bad_sub_mesh_or_tags() {
        let sub_meshes = table_with_sub_mesh(0, 6, 6);
        let mut lods = LodTable::new();
        lods.reset(sub_meshes.len());
        assert!(matches!(
            lods.set_lods(1, vec![], &sub_meshes),
            Err(MeshError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            lods.set_lods(0, vec![LodLevel::new(0, 1, 0, 3)], &sub_meshes),
            Err(MeshError::InvalidArgument(_))
        ));
        assert!(matches!(
            lods.set_lods(0, vec![LodLevel::new(0, 0, 0, 4)], &sub_meshes),
            Err(MeshError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_select_level_clamps() {
        let sub_meshes = table_with_sub_mesh(0, 12, 12);
        let mut lods = LodTable::new();
        lods.reset(sub_meshes.len());
        let curve = LodSelectionCurve::new(vec![1.0, 2.0, 3.0]).unwrap();

        assert_eq!(lods.select_level(0, 100.0, &curve).unwrap(), 0);

        lods.set_lods(
            0,
            vec![LodLevel::new(0, 0, 0, 9), LodLevel::new(0, 1, 9, 3)],
            &sub_meshes,
        )
        .unwrap();
        assert_eq!(lods.select_level(0, 0.5, &curve).unwrap(), 0);
        assert_eq!(lods.select_level(0, 1.5, &curve).unwrap(), 1);
        assert_eq!(lods.select_level(0, 100.0, &curve).unwrap(), 1);
        assert!(lods.select_level(3, 0.0, &curve).is_err());
    }

    #[test]
    fn test_metric_provider_closure() {
        struct Camera {
            distance: f32,
        }
        let provider = |camera: &Camera| camera.distance * 2.0;
        assert_eq!(provider.metric(&Camera { distance: 1.5 }), 3.0);
    }
}
