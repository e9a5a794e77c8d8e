//! Per-frame ordering: shared uniforms, the opaque batch, the moving
//! spotlight update and finally the sky behind everything.

use crate::core::framebuffer::DepthFunc;
use crate::core::math::transform::TransformFactory;
use crate::io::config::Config;
use crate::pipeline::backend::{DepthFuncGuard, DrawCall, GraphicsBackend, Program};
use crate::pipeline::uniforms::names;
use crate::scene::assets::{MeshInfo, SceneAssets};
use crate::scene::camera::Projection;
use crate::scene::camera_rig::CameraKind;
use crate::scene::layout::SceneLayout;
use crate::scene::light::SpotLight;
use crate::scene::light_rig::{LightRig, LightState};
use crate::scene::state::{SceneState, SurfaceMode};
use log::trace;
use nalgebra::{Matrix4, Point3, Vector3};

pub const DIFFUSE_UNIT: u32 = 0;
pub const SECONDARY_UNIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    BeginFrame,
    SetSharedUniforms,
    DrawOpaque,
    RecomputeMovingLight,
    DrawSky,
    EndFrame,
}

/// What one frame did.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub phases: Vec<FramePhase>,
    pub camera: CameraKind,
    pub view: Matrix4<f32>,
    pub lights: LightState,
    /// Written after the opaque draws; lit surfaces see it next frame.
    pub moving_spot: SpotLight,
    pub draw_calls: usize,
}

/// Issues one composited frame against a [`GraphicsBackend`].
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    pub light_rig: LightRig,
    pub layout: SceneLayout,
    pub projection: Projection,
    pub clear_color: Vector3<f32>,
    pub shininess: f32,
    static_models: Vec<Matrix4<f32>>,
}

impl FrameCompositor {
    pub fn new(
        light_rig: LightRig,
        layout: SceneLayout,
        projection: Projection,
        clear_color: Vector3<f32>,
        shininess: f32,
    ) -> Self {
        let static_models = layout.static_models();
        Self {
            light_rig,
            layout,
            projection,
            clear_color,
            shininess,
            static_models,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            LightRig::new(config.lights.params()),
            config.scene.layout(),
            config.projection(),
            Vector3::from(config.scene.clear_color),
            config.scene.shininess,
        )
    }

    pub fn render<B: GraphicsBackend + ?Sized>(
        &self,
        backend: &mut B,
        state: &mut SceneState,
        assets: &SceneAssets,
        time: f32,
    ) -> FrameReport {
        let mut phases = Vec::with_capacity(6);
        let mut draw_calls = 0;

        // BeginFrame
        phases.push(FramePhase::BeginFrame);
        let moving_model = self.layout.moving_model(time);
        let target = Point3::from(TransformFactory::translation_of(&moving_model));
        state.cameras.follow(&target);

        let camera = state.cameras.active_kind();
        let active = state.cameras.active();
        let view = active.view_matrix();
        let view_pos = TransformFactory::transform_point(&view, &active.position()).coords;
        let projection = self.projection.matrix();
        let program = state.shading().program();

        backend.clear(self.clear_color);
        backend.use_program(program);

        // SetSharedUniforms
        phases.push(FramePhase::SetSharedUniforms);
        let lights = self.light_rig.frame(&view, state.day_night());
        backend.set_mat4(names::PROJECTION, projection);
        backend.set_mat4(names::VIEW, view);
        backend.set_vec3(names::VIEW_POS, view_pos);
        backend.set_int(names::MATERIAL_DIFFUSE, DIFFUSE_UNIT as i32);
        backend.set_float(names::MATERIAL_SHININESS, self.shininess);
        lights.directional.write_uniforms(backend, names::DIR_LIGHT);
        lights.static_spot.write_uniforms(backend, names::SPOT_LIGHT);
        backend.set_bool(names::NORMAL_MAPPING, false);

        // DrawOpaque
        phases.push(FramePhase::DrawOpaque);
        backend.bind_texture(DIFFUSE_UNIT, assets.textures.grass);
        backend.set_mat4(names::MODEL, Matrix4::identity());
        draw_indexed(backend, &assets.floor, &mut draw_calls);

        self.bind_surface(backend, state.surface(), assets);

        backend.set_mat4(names::MODEL, moving_model);
        draw_arrays(backend, &assets.cube, &mut draw_calls);
        for model in &self.static_models {
            backend.set_mat4(names::MODEL, *model);
            draw_arrays(backend, &assets.cube, &mut draw_calls);
        }

        backend.set_mat4(names::MODEL, self.layout.sphere_model());
        draw_indexed(backend, &assets.sphere, &mut draw_calls);

        // RecomputeMovingLight
        phases.push(FramePhase::RecomputeMovingLight);
        let moving_spot = self
            .light_rig
            .moving_spot(&view, &moving_model, state.aim.value());
        moving_spot.write_uniforms(backend, names::MOVING_SPOT);

        // DrawSky
        phases.push(FramePhase::DrawSky);
        {
            let mut sky = DepthFuncGuard::new(&mut *backend, DepthFunc::LessEqual);
            sky.use_program(Program::Sky);
            sky.set_mat4(names::VIEW, TransformFactory::strip_translation(&view));
            sky.set_mat4(names::PROJECTION, projection);
            sky.set_int(names::SKYBOX, 0);
            sky.bind_texture(0, assets.textures.sky(state.day_night()));
            draw_arrays(&mut *sky, &assets.sky, &mut draw_calls);
        }

        phases.push(FramePhase::EndFrame);
        trace!("Frame at t={:.3}: {} draws from {:?} camera", time, draw_calls, camera);

        FrameReport {
            phases,
            camera,
            view,
            lights,
            moving_spot,
            draw_calls,
        }
    }

    fn bind_surface<B: GraphicsBackend + ?Sized>(
        &self,
        backend: &mut B,
        surface: SurfaceMode,
        assets: &SceneAssets,
    ) {
        let textures = &assets.textures;
        match surface {
            SurfaceMode::Plain => {
                backend.bind_texture(DIFFUSE_UNIT, textures.container_diffuse);
                backend.bind_texture(SECONDARY_UNIT, textures.container_specular);
                backend.set_int(names::MATERIAL_SPECULAR, SECONDARY_UNIT as i32);
            }
            SurfaceMode::NormalMapped => {
                backend.bind_texture(DIFFUSE_UNIT, textures.brick_diffuse);
                backend.bind_texture(SECONDARY_UNIT, textures.brick_normal);
                backend.set_int(names::MATERIAL_NORMAL, SECONDARY_UNIT as i32);
                backend.set_bool(names::NORMAL_MAPPING, true);
            }
        }
    }
}

fn draw_arrays<B: GraphicsBackend + ?Sized>(backend: &mut B, mesh: &MeshInfo, draws: &mut usize) {
    backend.draw(
        mesh.handle,
        DrawCall::Arrays {
            first: 0,
            count: mesh.count,
        },
    );
    *draws += 1;
}

fn draw_indexed<B: GraphicsBackend + ?Sized>(backend: &mut B, mesh: &MeshInfo, draws: &mut usize) {
    backend.draw(mesh.handle, DrawCall::Indexed { count: mesh.count });
    *draws += 1;
}
