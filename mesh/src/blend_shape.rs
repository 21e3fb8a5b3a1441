//! Blend shape (morph target) frames.

use crate::error::{MeshError, MeshResult};
use crate::math::Vec3;

/// One frame of a blend shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShapeFrame {
    /// Weight at which the frame is fully applied.
    pub weight: f32,
    /// Per-vertex position deltas.
    pub delta_vertices: Vec<Vec3>,
    /// Per-vertex normal deltas.
    pub delta_normals: Option<Vec<Vec3>>,
    /// Per-vertex tangent deltas.
    pub delta_tangents: Option<Vec<Vec3>>,
}

/// A named blend shape with frames ordered by weight.
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShape {
    name: String,
    frames: Vec<BlendShapeFrame>,
}

impl BlendShape {
    /// Shape name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames in increasing weight order.
    pub fn frames(&self) -> &[BlendShapeFrame] {
        &self.frames
    }
}

/// All blend shapes of a mesh.
#[derive(Debug, Clone, Default)]
pub struct BlendShapeSet {
    shapes: Vec<BlendShape>,
}

impl BlendShapeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame to the shape called `name`, creating the shape if needed.
    ///
    /// Every supplied delta array must hold exactly `vertex_count` entries.
    /// The frame weight must be strictly greater than the shape's last frame.
    pub fn add_frame(
        &mut self,
        name: &str,
        weight: f32,
        delta_vertices: Vec<Vec3>,
        delta_normals: Option<Vec<Vec3>>,
        delta_tangents: Option<Vec<Vec3>>,
        vertex_count: u32,
    ) -> MeshResult<()> {
        if name.is_empty() {
            return Err(MeshError::InvalidArgument(
                "blend shape name must not be empty".into(),
            ));
        }
        if !weight.is_finite() {
            return Err(MeshError::InvalidArgument(format!(
                "blend shape '{name}': frame weight {weight} is not finite"
            )));
        }
        let deltas = [
            ("blend shape delta vertices", Some(&delta_vertices)),
            ("blend shape delta normals", delta_normals.as_ref()),
            ("blend shape delta tangents", delta_tangents.as_ref()),
        ];
        for (what, delta) in deltas {
            if let Some(delta) = delta {
                if delta.len() != vertex_count as usize {
                    return Err(MeshError::CountMismatch {
                        what,
                        expected: vertex_count as u64,
                        actual: delta.len() as u64,
                    });
                }
            }
        }

        let frame = BlendShapeFrame {
            weight,
            delta_vertices,
            delta_normals,
            delta_tangents,
        };
        match self.shapes.iter_mut().find(|s| s.name == name) {
            Some(shape) => {
                if let Some(last) = shape.frames.last() {
                    if weight <= last.weight {
                        return Err(MeshError::InvalidArgument(format!(
                            "blend shape '{name}': frame weight {weight} must be greater \
                             than previous weight {}",
                            last.weight
                        )));
                    }
                }
                shape.frames.push(frame);
            }
            None => self.shapes.push(BlendShape {
                name: name.to_owned(),
                frames: vec![frame],
            }),
        }
        log::trace!("Blend shape '{name}' frame added at weight {weight}");
        Ok(())
    }

    /// Number of blend shapes.
    pub fn count(&self) -> usize {
        self.shapes.len()
    }

    /// Whether the set holds no blend shapes.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Shape at `index`.
    pub fn shape(&self, index: usize) -> MeshResult<&BlendShape> {
        self.shapes.get(index).ok_or(MeshError::IndexOutOfRange {
            what: "blend shape",
            index: index as u64,
            limit: self.shapes.len() as u64,
        })
    }

    /// Name of the shape at `index`.
    pub fn name(&self, index: usize) -> MeshResult<&str> {
        self.shape(index).map(BlendShape::name)
    }

    /// Position of the shape called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.name == name)
    }

    /// Number of frames of the shape at `index`.
    pub fn frame_count(&self, index: usize) -> MeshResult<usize> {
        self.shape(index).map(|s| s.frames.len())
    }

    /// Frame data.
    pub fn frame(&self, index: usize, frame: usize) -> MeshResult<&BlendShapeFrame> {
        let shape = self.shape(index)?;
        shape.frames.get(frame).ok_or(MeshError::IndexOutOfRange {
            what: "blend shape frame",
            index: frame as u64,
            limit: shape.frames.len() as u64,
        })
    }

    /// Weight of one frame.
    pub fn frame_weight(&self, index: usize, frame: usize) -> MeshResult<f32> {
        self.frame(index, frame).map(|f| f.weight)
    }

    /// Iterate shapes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &BlendShape> {
        self.shapes.iter()
    }

    /// Remove every shape.
    pub fn clear(&mut self) {
        if !self.shapes.is_empty() {
            log::debug!("Cleared {} blend shapes", self.shapes.len());
        }
        self.shapes.clear();
    }
}
