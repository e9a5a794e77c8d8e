use crate::core::framebuffer::{DepthFunc, FrameBuffer};
use crate::core::geometry::{RawTangentVertex, TangentVertex, Vertex};
use crate::error::{RenderError, Result};
use crate::io::image::DecodedImage;
use crate::pipeline::backend::{
    DrawCall, GraphicsBackend, MeshHandle, Program, TextureHandle, VertexData, VertexLayout,
};
use crate::pipeline::renderer::Renderer;
use crate::pipeline::shaders::gouraud::GouraudShader;
use crate::pipeline::shaders::lighting::{DrawTransforms, SceneLights, SurfaceMaterial};
use crate::pipeline::shaders::phong::PhongShader;
use crate::pipeline::shaders::sky::SkyShader;
use crate::pipeline::uniforms::{UniformStore, UniformValue, names};
use crate::scene::texture::{CubeMap, Texture};
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use std::collections::HashMap;

/// Shininess used when a program never received one.
const DEFAULT_SHININESS: f32 = 32.0;

struct SoftwareMesh {
    vertices: Vec<TangentVertex>,
    indices: Option<Vec<u32>>,
}

enum TextureSlot {
    Flat(Texture),
    Cube(CubeMap),
}

/// CPU implementation of [`GraphicsBackend`] on top of the clipping
/// rasterizer. Draws complete before `draw` returns.
pub struct SoftwareBackend {
    renderer: Renderer,
    meshes: Vec<SoftwareMesh>,
    textures: Vec<TextureSlot>,
    bound: HashMap<u32, TextureHandle>,
    program: Program,
    uniforms: HashMap<Program, UniformStore>,
}

impl SoftwareBackend {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            renderer: Renderer::new(width, height, sample_count),
            meshes: Vec::new(),
            textures: Vec::new(),
            bound: HashMap::new(),
            program: Program::Phong,
            uniforms: HashMap::new(),
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.renderer.framebuffer
    }

    /// Uniforms currently held by `program`.
    pub fn uniforms(&self, program: Program) -> Option<&UniformStore> {
        self.uniforms.get(&program)
    }

    fn flat_texture(&self, unit: Option<i32>) -> Option<&Texture> {
        match self.slot(unit?)? {
            TextureSlot::Flat(texture) => Some(texture),
            TextureSlot::Cube(_) => None,
        }
    }

    fn cube_texture(&self, unit: Option<i32>) -> Option<&CubeMap> {
        match self.slot(unit?)? {
            TextureSlot::Cube(cube) => Some(cube),
            TextureSlot::Flat(_) => None,
        }
    }

    fn slot(&self, unit: i32) -> Option<&TextureSlot> {
        let handle = self.bound.get(&u32::try_from(unit).ok()?)?;
        self.textures.get(handle.0)
    }

    fn surface_material(&self, store: &UniformStore) -> SurfaceMaterial<'_> {
        let normal_mapping = store.bool(names::NORMAL_MAPPING).unwrap_or(false);
        let secondary_unit = if normal_mapping {
            store.int(names::MATERIAL_NORMAL)
        } else {
            store.int(names::MATERIAL_SPECULAR)
        };
        SurfaceMaterial {
            diffuse: self.flat_texture(Some(store.int(names::MATERIAL_DIFFUSE).unwrap_or(0))),
            secondary: self.flat_texture(secondary_unit),
            normal_mapping,
            shininess: store
                .float(names::MATERIAL_SHININESS)
                .unwrap_or(DEFAULT_SHININESS),
        }
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn upload_mesh(&mut self, data: &VertexData<'_>) -> Result<MeshHandle> {
        let vertices = decode_vertices(data.bytes, &data.layout)?;
        debug!(
            "Uploaded mesh #{}: {} vertices, {} indices",
            self.meshes.len(),
            vertices.len(),
            data.indices.map_or(0, |i| i.len())
        );
        self.meshes.push(SoftwareMesh {
            vertices,
            indices: data.indices.map(<[u32]>::to_vec),
        });
        Ok(MeshHandle(self.meshes.len() - 1))
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> TextureHandle {
        self.textures
            .push(TextureSlot::Flat(Texture::from_image(image)));
        TextureHandle(self.textures.len() - 1)
    }

    fn upload_cubemap(&mut self, faces: &[DecodedImage; 6]) -> TextureHandle {
        self.textures
            .push(TextureSlot::Cube(CubeMap::from_images(faces)));
        TextureHandle(self.textures.len() - 1)
    }

    fn clear(&mut self, color: Vector3<f32>) {
        self.renderer.clear(color);
    }

    fn use_program(&mut self, program: Program) {
        self.program = program;
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms
            .entry(self.program)
            .or_default()
            .set(name, value);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.bound.insert(unit, texture);
    }

    fn depth_func(&self) -> DepthFunc {
        self.renderer.rasterizer.depth_func
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.renderer.rasterizer.depth_func = func;
    }

    fn draw(&mut self, mesh: MeshHandle, call: DrawCall) {
        let Some(target) = self.meshes.get(mesh.0) else {
            warn!("Draw with unknown mesh handle {:?}", mesh);
            return;
        };
        let empty = UniformStore::new();
        let store = self.uniforms.get(&self.program).unwrap_or(&empty);
        let vertices = &target.vertices;
        let indices = target.indices.as_deref();

        match self.program {
            Program::Phong => {
                let shader = PhongShader::new(
                    DrawTransforms::from_uniforms(store),
                    SceneLights::from_uniforms(store),
                    self.surface_material(store),
                );
                self.renderer.draw(vertices, indices, call, &shader);
            }
            Program::Gouraud => {
                let shader = GouraudShader::new(
                    DrawTransforms::from_uniforms(store),
                    SceneLights::from_uniforms(store),
                    self.surface_material(store),
                );
                self.renderer.draw(vertices, indices, call, &shader);
            }
            Program::Sky => {
                let view = store.mat4(names::VIEW).unwrap_or_else(Matrix4::identity);
                let projection = store
                    .mat4(names::PROJECTION)
                    .unwrap_or_else(Matrix4::identity);
                let shader = SkyShader {
                    view_projection: projection * view,
                    cubemap: self.cube_texture(Some(store.int(names::SKYBOX).unwrap_or(0))),
                };
                self.renderer.draw(vertices, indices, call, &shader);
            }
        }
    }
}

/// Unpacks an interleaved f32 buffer. Attributes the layout lacks are zero.
fn decode_vertices(bytes: &[u8], layout: &VertexLayout) -> Result<Vec<TangentVertex>> {
    let stride = layout.stride;
    if stride == 0 || stride % 4 != 0 || bytes.len() % stride != 0 {
        return Err(RenderError::VertexBuffer {
            len: bytes.len(),
            stride,
        });
    }

    if *layout == RawTangentVertex::layout() {
        let raw: Vec<RawTangentVertex> = bytemuck::pod_collect_to_vec(bytes);
        return Ok(raw.iter().map(TangentVertex::from_raw).collect());
    }

    let read = |record: &[u8], offset: usize, n: usize| -> Option<[f32; 3]> {
        let mut out = [0.0; 3];
        for (i, value) in out.iter_mut().enumerate().take(n.min(3)) {
            let start = offset + i * 4;
            *value = bytemuck::pod_read_unaligned(record.get(start..start + 4)?);
        }
        Some(out)
    };

    bytes
        .chunks_exact(stride)
        .map(|record| -> Result<TangentVertex> {
            let mut position = [0.0; 3];
            let mut normal = [0.0; 3];
            let mut texcoord = [0.0; 3];
            let mut tangent = [0.0; 3];
            let mut bitangent = [0.0; 3];
            for attribute in layout.attributes {
                let target = match attribute.location {
                    RawTangentVertex::LOCATION_POSITION => &mut position,
                    RawTangentVertex::LOCATION_NORMAL => &mut normal,
                    RawTangentVertex::LOCATION_TEXCOORD => &mut texcoord,
                    RawTangentVertex::LOCATION_TANGENT => &mut tangent,
                    RawTangentVertex::LOCATION_BITANGENT => &mut bitangent,
                    _ => continue,
                };
                *target = read(record, attribute.offset, attribute.components).ok_or(
                    RenderError::VertexBuffer {
                        len: bytes.len(),
                        stride,
                    },
                )?;
            }
            Ok(TangentVertex::new(
                Vertex::new(
                    Point3::from(position),
                    Vector3::from(normal),
                    Vector2::new(texcoord[0], texcoord[1]),
                ),
                Vector3::from(tangent),
                Vector3::from(bitangent),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_only_buffers_decode() {
        let positions: [f32; 6] = [1.0, 2.0, 3.0, -1.0, -2.0, -3.0];
        let vertices = decode_vertices(
            bytemuck::cast_slice(&positions[..]),
            &RawTangentVertex::position_only_layout(),
        )
        .unwrap();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].vertex.position, Point3::new(-1.0, -2.0, -3.0));
        assert_eq!(vertices[1].tangent, Vector3::zeros());
    }

    #[test]
    fn ragged_buffers_are_rejected() {
        let bytes = [0u8; 10];
        assert!(matches!(
            decode_vertices(&bytes, &RawTangentVertex::layout()),
            Err(RenderError::VertexBuffer { len: 10, stride: 56 })
        ));
    }

    #[test]
    fn uniforms_are_per_program() {
        let mut backend = SoftwareBackend::new(4, 4, 1);
        backend.use_program(Program::Phong);
        backend.set_float(names::MATERIAL_SHININESS, 8.0);
        backend.use_program(Program::Sky);
        backend.set_int(names::SKYBOX, 0);

        let phong = backend.uniforms(Program::Phong).unwrap();
        assert_eq!(phong.float(names::MATERIAL_SHININESS), Some(8.0));
        assert!(!phong.contains(names::SKYBOX));
        assert!(backend.uniforms(Program::Gouraud).is_none());
    }
}
