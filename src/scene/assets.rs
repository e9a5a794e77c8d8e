use crate::core::geometry::{RawTangentVertex, TangentVertex, Vertex};
use crate::core::tangent::{attach_normal_frames, build_tangent_vertices};
use crate::error::Result;
use crate::io::config::Config;
use crate::io::image::{DecodedImage, decode_image};
use crate::io::obj_loader::load_obj;
use crate::pipeline::backend::{GraphicsBackend, MeshHandle, TextureHandle, VertexData};
use crate::scene::light_rig::DayNight;
use crate::scene::primitives::{SKY_CUBE, cube, floor, uv_sphere};
use log::{error, info, warn};
use std::path::Path;

/// What a texture is used for; decides the placeholder texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRole {
    Diffuse,
    Specular,
    Normal,
    Sky,
}

impl TextureRole {
    pub fn placeholder(self) -> DecodedImage {
        DecodedImage::solid(match self {
            TextureRole::Diffuse => [255, 0, 255],
            TextureRole::Specular => [0, 0, 0],
            TextureRole::Normal => [128, 128, 255],
            TextureRole::Sky => [0, 0, 0],
        })
    }
}

/// Decodes `path`, or logs the failure and returns the role's placeholder.
pub fn load_or_placeholder(path: &Path, role: TextureRole) -> DecodedImage {
    match decode_image(path) {
        Ok(image) => image,
        Err(err) => {
            error!("{}; using {:?} placeholder", err, role);
            role.placeholder()
        }
    }
}

/// An uploaded mesh plus the element count its draw call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshInfo {
    pub handle: MeshHandle,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneTextures {
    pub grass: TextureHandle,
    pub container_diffuse: TextureHandle,
    pub container_specular: TextureHandle,
    pub brick_diffuse: TextureHandle,
    pub brick_normal: TextureHandle,
    pub sky_day: TextureHandle,
    pub sky_night: TextureHandle,
}

impl SceneTextures {
    pub fn sky(&self, mode: DayNight) -> TextureHandle {
        match mode {
            DayNight::Day => self.sky_day,
            DayNight::Night => self.sky_night,
        }
    }
}

/// Every mesh and texture the scene draws, resident in one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneAssets {
    /// Triangle list with per-triangle tangent frames.
    pub cube: MeshInfo,
    pub floor: MeshInfo,
    pub sphere: MeshInfo,
    pub sky: MeshInfo,
    pub textures: SceneTextures,
}

impl SceneAssets {
    /// Builds the procedural meshes, decodes every texture and uploads all
    /// of it. Texture failures are replaced by placeholders; geometry
    /// failures are returned.
    pub fn load<B: GraphicsBackend + ?Sized>(backend: &mut B, config: &Config) -> Result<Self> {
        let scene = &config.scene;

        let cube_mesh = build_tangent_vertices(&cube())?;
        let cube = upload_tangent_mesh(backend, &cube_mesh.vertices, None)?;

        let (floor_vertices, floor_indices) =
            floor(scene.floor_half_extent, scene.floor_height, scene.floor_uv_repeat);
        let floor = upload_indexed(backend, &floor_vertices, &floor_indices)?;

        let sphere = match &scene.obj_path {
            Some(path) => match load_obj(config.assets.resolve(path)) {
                Ok(mesh) => upload_indexed(backend, &mesh.vertices, &mesh.indices)?,
                Err(err) => {
                    warn!("{}; falling back to the UV sphere", err);
                    upload_sphere(backend, config)?
                }
            },
            None => upload_sphere(backend, config)?,
        };

        let sky = MeshInfo {
            handle: backend.upload_mesh(&VertexData {
                bytes: bytemuck::cast_slice(&SKY_CUBE[..]),
                layout: RawTangentVertex::position_only_layout(),
                indices: None,
            })?,
            count: SKY_CUBE.len(),
        };

        let textures = upload_textures(backend, config);
        info!(
            "Scene assets ready: cube {} vertices, floor {} indices, sphere {} indices",
            cube.count, floor.count, sphere.count
        );

        Ok(Self {
            cube,
            floor,
            sphere,
            sky,
            textures,
        })
    }
}

fn upload_sphere<B: GraphicsBackend + ?Sized>(backend: &mut B, config: &Config) -> Result<MeshInfo> {
    let scene = &config.scene;
    let (vertices, indices) = uv_sphere(scene.sphere_radius, scene.sphere_sectors, scene.sphere_stacks);
    upload_indexed(backend, &vertices, &indices)
}

fn upload_indexed<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    vertices: &[Vertex],
    indices: &[u32],
) -> Result<MeshInfo> {
    upload_tangent_mesh(backend, &attach_normal_frames(vertices), Some(indices))
}

fn upload_tangent_mesh<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    vertices: &[TangentVertex],
    indices: Option<&[u32]>,
) -> Result<MeshInfo> {
    let raw: Vec<RawTangentVertex> = vertices.iter().map(TangentVertex::to_raw).collect();
    let handle = backend.upload_mesh(&VertexData {
        bytes: bytemuck::cast_slice(&raw),
        layout: RawTangentVertex::layout(),
        indices,
    })?;
    Ok(MeshInfo {
        handle,
        count: indices.map_or(vertices.len(), <[u32]>::len),
    })
}

fn upload_textures<B: GraphicsBackend + ?Sized>(backend: &mut B, config: &Config) -> SceneTextures {
    let assets = &config.assets;
    let mut texture = |path: &Path, role: TextureRole| {
        let image = load_or_placeholder(&assets.resolve(path), role);
        backend.upload_texture(&image)
    };

    let grass = texture(&assets.grass, TextureRole::Diffuse);
    let container_diffuse = texture(&assets.container_diffuse, TextureRole::Diffuse);
    let container_specular = texture(&assets.container_specular, TextureRole::Specular);
    let brick_diffuse = texture(&assets.brick_diffuse, TextureRole::Diffuse);
    let brick_normal = texture(&assets.brick_normal, TextureRole::Normal);

    let mut cubemap = |faces: &[std::path::PathBuf; 6]| {
        let images: [DecodedImage; 6] =
            std::array::from_fn(|i| load_or_placeholder(&assets.resolve(&faces[i]), TextureRole::Sky));
        backend.upload_cubemap(&images)
    };
    let sky_day = cubemap(&assets.sky_day);
    let sky_night = cubemap(&assets.sky_night);

    SceneTextures {
        grass,
        container_diffuse,
        container_specular,
        brick_diffuse,
        brick_normal,
        sky_day,
        sky_night,
    }
}
