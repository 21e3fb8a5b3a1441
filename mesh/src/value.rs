//! Logical vertex value types and component encoding.
//!
//! Attribute data is written and read through [`VertexValue`] types such as
//! `[f32; 3]`, [`Vec3`] or `[u32; 4]`. The value's dimension and component
//! class must match the attribute declaration; the storage format may be
//! narrower than the logical value:
//!
//! - Floats written to normalized formats are clamped to the format range and
//!   rounded to the nearest step. Reading promotes back, so a value round-trips
//!   within one step (`1/255` for `Unorm8`).
//! - Floats written to `Float16` are rounded to the nearest half.
//! - Integers written to narrower integer formats are clamped.

use half::f16;

use crate::error::{MeshError, MeshResult};
use crate::layout::{ComponentClass, VertexAttribute, VertexAttributeFormat};
use crate::math::{Vec2, Vec3, Vec4};

/// A logical per-vertex value that can be written to or read from an attribute.
pub trait VertexValue: Copy {
    /// Number of components.
    const DIMENSION: u8;
    /// Component class.
    const CLASS: ComponentClass;

    /// Component `index` (< `DIMENSION`) widened to `f64`.
    fn component(&self, index: usize) -> f64;

    /// Build a value from widened components. Only the first `DIMENSION` are used.
    fn from_components(components: &[f64; 4]) -> Self;

    /// Human-readable shape, e.g. `Floatx3`.
    fn shape() -> String {
        format!("{:?}x{}", Self::CLASS, Self::DIMENSION)
    }
}

impl VertexValue for f32 {
    const DIMENSION: u8 = 1;
    const CLASS: ComponentClass = ComponentClass::Float;

    fn component(&self, _index: usize) -> f64 {
        *self as f64
    }

    fn from_components(c: &[f64; 4]) -> Self {
        c[0] as f32
    }
}

impl VertexValue for u32 {
    const DIMENSION: u8 = 1;
    const CLASS: ComponentClass = ComponentClass::Uint;

    fn component(&self, _index: usize) -> f64 {
        *self as f64
    }

    fn from_components(c: &[f64; 4]) -> Self {
        c[0] as u32
    }
}

impl VertexValue for i32 {
    const DIMENSION: u8 = 1;
    const CLASS: ComponentClass = ComponentClass::Sint;

    fn component(&self, _index: usize) -> f64 {
        *self as f64
    }

    fn from_components(c: &[f64; 4]) -> Self {
        c[0] as i32
    }
}

macro_rules! impl_vertex_value_array {
    ($scalar:ty, $class:expr, $($n:literal),+) => {
        $(
            impl VertexValue for [$scalar; $n] {
                const DIMENSION: u8 = $n;
                const CLASS: ComponentClass = $class;

                fn component(&self, index: usize) -> f64 {
                    self[index] as f64
                }

                fn from_components(c: &[f64; 4]) -> Self {
                    std::array::from_fn(|i| c[i] as $scalar)
                }
            }
        )+
    };
}

impl_vertex_value_array!(f32, ComponentClass::Float, 2, 3, 4);
impl_vertex_value_array!(u32, ComponentClass::Uint, 2, 3, 4);
impl_vertex_value_array!(i32, ComponentClass::Sint, 2, 3, 4);

macro_rules! impl_vertex_value_vector {
    ($vector:ty, $n:literal) => {
        impl VertexValue for $vector {
            const DIMENSION: u8 = $n;
            const CLASS: ComponentClass = ComponentClass::Float;

            fn component(&self, index: usize) -> f64 {
                self[index] as f64
            }

            fn from_components(c: &[f64; 4]) -> Self {
                <$vector>::from_fn(|i, _| c[i] as f32)
            }
        }
    };
}

impl_vertex_value_vector!(Vec2, 2);
impl_vertex_value_vector!(Vec3, 3);
impl_vertex_value_vector!(Vec4, 4);

/// Check that `T` can be stored in `attr`.
pub(crate) fn check_compatible<T: VertexValue>(attr: &VertexAttribute) -> MeshResult<()> {
    if T::DIMENSION != attr.dimension || T::CLASS != attr.format.class() {
        return Err(MeshError::FormatMismatch {
            semantic: attr.semantic,
            declared: attr.shape(),
            provided: T::shape(),
        });
    }
    Ok(())
}

/// Encode one widened component into `dst` (exactly `format.size()` bytes).
pub(crate) fn encode_component(format: VertexAttributeFormat, value: f64, dst: &mut [u8]) {
    use VertexAttributeFormat as F;

    fn unorm(value: f64, max: f64) -> f64 {
        (value.clamp(0.0, 1.0) * max).round()
    }
    fn snorm(value: f64, max: f64) -> f64 {
        (value.clamp(-1.0, 1.0) * max).round()
    }

    match format {
        F::Float32 => dst.copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        F::Float16 => dst.copy_from_slice(bytemuck::bytes_of(&f16::from_f64(value))),
        F::Unorm8 => dst[0] = unorm(value, u8::MAX as f64) as u8,
        F::Snorm8 => dst[0] = snorm(value, i8::MAX as f64) as i8 as u8,
        F::Unorm16 => {
            let v = unorm(value, u16::MAX as f64) as u16;
            dst.copy_from_slice(bytemuck::bytes_of(&v));
        }
        F::Snorm16 => {
            let v = snorm(value, i16::MAX as f64) as i16;
            dst.copy_from_slice(bytemuck::bytes_of(&v));
        }
        // `as` saturates on float-to-int casts, which is the clamping we want.
        F::Uint8 => dst[0] = value as u8,
        F::Sint8 => dst[0] = value as i8 as u8,
        F::Uint16 => dst.copy_from_slice(bytemuck::bytes_of(&(value as u16))),
        F::Sint16 => dst.copy_from_slice(bytemuck::bytes_of(&(value as i16))),
        F::Uint32 => dst.copy_from_slice(bytemuck::bytes_of(&(value as u32))),
        F::Sint32 => dst.copy_from_slice(bytemuck::bytes_of(&(value as i32))),
    }
}

/// Decode one component from `src` (exactly `format.size()` bytes).
pub(crate) fn decode_component(format: VertexAttributeFormat, src: &[u8]) -> f64 {
    use VertexAttributeFormat as F;

    match format {
        F::Float32 => bytemuck::pod_read_unaligned::<f32>(src) as f64,
        F::Float16 => bytemuck::pod_read_unaligned::<f16>(src).to_f64(),
        F::Unorm8 => src[0] as f64 / u8::MAX as f64,
        F::Snorm8 => (src[0] as i8 as f64 / i8::MAX as f64).max(-1.0),
        F::Unorm16 => bytemuck::pod_read_unaligned::<u16>(src) as f64 / u16::MAX as f64,
        F::Snorm16 => {
            (bytemuck::pod_read_unaligned::<i16>(src) as f64 / i16::MAX as f64).max(-1.0)
        }
        F::Uint8 => src[0] as f64,
        F::Sint8 => src[0] as i8 as f64,
        F::Uint16 => bytemuck::pod_read_unaligned::<u16>(src) as f64,
        F::Sint16 => bytemuck::pod_read_unaligned::<i16>(src) as f64,
        F::Uint32 => bytemuck::pod_read_unaligned::<u32>(src) as f64,
        F::Sint32 => bytemuck::pod_read_unaligned::<i32>(src) as f64,
    }
}

/// Encode a whole value at the start of `dst`.
pub(crate) fn encode_value<T: VertexValue>(attr: &VertexAttribute, value: &T, dst: &mut [u8]) {
    let size = attr.format.size();
    for c in 0..attr.dimension as usize {
        encode_component(attr.format, value.component(c), &mut dst[c * size..(c + 1) * size]);
    }
}

/// Decode a whole value from the start of `src`.
pub(crate) fn decode_value<T: VertexValue>(attr: &VertexAttribute, src: &[u8]) -> T {
    let size = attr.format.size();
    let mut components = [0.0f64; 4];
    for (c, slot) in components.iter_mut().enumerate().take(attr.dimension as usize) {
        *slot = decode_component(attr.format, &src[c * size..(c + 1) * size]);
    }
    T::from_components(&components)
}
