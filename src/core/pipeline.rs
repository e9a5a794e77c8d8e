use crate::core::geometry::TangentVertex;
use nalgebra::{Vector3, Vector4};
use std::ops::{Add, Mul};

/// Per-vertex data that can be blended across a triangle's surface.
///
/// `Add + Mul<f32>` give the linear combination used by clipping and
/// barycentric interpolation; `Send + Sync` because fragments are shaded in
/// parallel.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
}

impl Interpolatable for Vector3<f32> {}

/// The programmable stages of the software pipeline.
pub trait Shader: Send + Sync {
    /// Vertex outputs interpolated for each fragment.
    type Varying: Interpolatable;

    /// Transforms a vertex into homogeneous clip space and returns the varying
    /// that will be interpolated across the primitive.
    fn vertex(&self, vertex: &TangentVertex) -> (Vector4<f32>, Self::Varying);

    /// Linear RGB colour of one fragment. Values above 1 are clamped on output.
    fn fragment(&self, varying: Self::Varying) -> Vector3<f32>;
}
