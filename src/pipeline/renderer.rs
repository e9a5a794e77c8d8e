use crate::core::framebuffer::FrameBuffer;
use crate::core::geometry::TangentVertex;
use crate::core::pipeline::Shader;
use crate::core::rasterizer::Rasterizer;
use crate::pipeline::backend::DrawCall;
use log::warn;
use nalgebra::Vector3;

/// Runs vertex processing and primitive assembly, then hands triangles to
/// the rasterizer.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    /// `sample_count`: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
        }
    }

    pub fn clear(&mut self, color: Vector3<f32>) {
        self.framebuffer.clear(color);
    }

    /// Draws the triangles selected by `call`. Out-of-range ranges are
    /// truncated to the available data.
    pub fn draw<S: Shader>(
        &self,
        vertices: &[TangentVertex],
        indices: Option<&[u32]>,
        call: DrawCall,
        shader: &S,
    ) {
        match (call, indices) {
            (DrawCall::Arrays { first, count }, _) => {
                let start = first.min(vertices.len());
                let end = first.saturating_add(count).min(vertices.len());
                if end - start < count {
                    warn!("Draw of {} vertices from {} truncated to {}", count, first, end - start);
                }
                for triangle in vertices[start..end].chunks_exact(3) {
                    self.draw_triangle(shader, [&triangle[0], &triangle[1], &triangle[2]]);
                }
            }
            (DrawCall::Indexed { count }, Some(indices)) => {
                let count = if count > indices.len() {
                    warn!("Indexed draw of {} truncated to {}", count, indices.len());
                    indices.len()
                } else {
                    count
                };
                for tri in indices[..count].chunks_exact(3) {
                    let fetch = |i: u32| vertices.get(i as usize);
                    match (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) {
                        (Some(a), Some(b), Some(c)) => self.draw_triangle(shader, [a, b, c]),
                        _ => warn!("Skipping triangle with out-of-range index {:?}", tri),
                    }
                }
            }
            (DrawCall::Indexed { .. }, None) => {
                warn!("Indexed draw on a mesh without an index buffer");
            }
        }
    }

    fn draw_triangle<S: Shader>(&self, shader: &S, triangle: [&TangentVertex; 3]) {
        let [(p0, v0), (p1, v1), (p2, v2)] = triangle.map(|vertex| shader.vertex(vertex));
        self.rasterizer
            .rasterize_triangle(&self.framebuffer, shader, &[p0, p1, p2], &[v0, v1, v2]);
    }
}
