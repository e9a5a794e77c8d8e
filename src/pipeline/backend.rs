//! The graphics collaborator: buffer and texture uploads, per-program
//! uniforms, depth state and draw submission.

use crate::core::framebuffer::DepthFunc;
use crate::error::Result;
use crate::io::image::DecodedImage;
use crate::pipeline::uniforms::UniformValue;
use nalgebra::{Matrix4, Vector3};
use std::ops::{Deref, DerefMut};

/// One attribute inside an interleaved vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of f32 components.
    pub components: usize,
    /// Byte offset inside the record.
    pub offset: usize,
}

/// Stride and attributes of an interleaved f32 vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub attributes: &'static [VertexAttribute],
}

/// A static vertex buffer plus optional index buffer, ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct VertexData<'a> {
    pub bytes: &'a [u8],
    pub layout: VertexLayout,
    pub indices: Option<&'a [u32]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

/// Shader programs known to every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Phong,
    Gouraud,
    Sky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Non-indexed triangles starting at vertex `first`.
    Arrays { first: usize, count: usize },
    /// The first `count` indices of the mesh's index buffer.
    Indexed { count: usize },
}

impl DrawCall {
    pub fn vertex_count(&self) -> usize {
        match *self {
            DrawCall::Arrays { count, .. } | DrawCall::Indexed { count } => count,
        }
    }
}

pub trait GraphicsBackend {
    fn upload_mesh(&mut self, data: &VertexData<'_>) -> Result<MeshHandle>;

    fn upload_texture(&mut self, image: &DecodedImage) -> TextureHandle;

    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    fn upload_cubemap(&mut self, faces: &[DecodedImage; 6]) -> TextureHandle;

    /// Clears colour and resets depth to the far plane.
    fn clear(&mut self, color: Vector3<f32>);

    fn use_program(&mut self, program: Program);

    /// Sets a uniform on the program made current by [`Self::use_program`].
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn depth_func(&self) -> DepthFunc;

    fn set_depth_func(&mut self, func: DepthFunc);

    fn draw(&mut self, mesh: MeshHandle, call: DrawCall);

    fn set_mat4(&mut self, name: &str, value: Matrix4<f32>) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vector3<f32>) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }
}

/// Sets a depth function for as long as the guard lives and restores the
/// previous one on drop.
pub struct DepthFuncGuard<'a, B: GraphicsBackend + ?Sized> {
    backend: &'a mut B,
    previous: DepthFunc,
}

impl<'a, B: GraphicsBackend + ?Sized> DepthFuncGuard<'a, B> {
    pub fn new(backend: &'a mut B, func: DepthFunc) -> Self {
        let previous = backend.depth_func();
        backend.set_depth_func(func);
        Self { backend, previous }
    }
}

impl<B: GraphicsBackend + ?Sized> Deref for DepthFuncGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: GraphicsBackend + ?Sized> DerefMut for DepthFuncGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: GraphicsBackend + ?Sized> Drop for DepthFuncGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.set_depth_func(self.previous);
    }
}
