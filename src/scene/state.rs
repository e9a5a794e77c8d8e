use crate::pipeline::backend::Program;
use crate::scene::camera_rig::CameraRig;
use crate::scene::light_rig::{DayNight, SpotAim};
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingModel {
    /// Per-fragment lighting.
    #[default]
    Phong,
    /// Per-vertex lighting.
    Gouraud,
}

impl ShadingModel {
    pub fn program(self) -> Program {
        match self {
            ShadingModel::Phong => Program::Phong,
            ShadingModel::Gouraud => Program::Gouraud,
        }
    }
}

/// Textures applied to the cubes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceMode {
    /// Container diffuse plus specular map.
    #[default]
    Plain,
    /// Brick diffuse plus tangent-space normal map.
    NormalMapped,
}

/// Everything input handling mutates between frames.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub cameras: CameraRig,
    pub aim: SpotAim,
    shading: ShadingModel,
    day_night: DayNight,
    surface: SurfaceMode,
}

impl SceneState {
    pub fn new(cameras: CameraRig, aim: SpotAim) -> Self {
        Self {
            cameras,
            aim,
            shading: ShadingModel::default(),
            day_night: DayNight::default(),
            surface: SurfaceMode::default(),
        }
    }

    pub fn shading(&self) -> ShadingModel {
        self.shading
    }

    pub fn day_night(&self) -> DayNight {
        self.day_night
    }

    pub fn surface(&self) -> SurfaceMode {
        self.surface
    }

    pub fn set_shading(&mut self, shading: ShadingModel) {
        if self.shading != shading {
            info!("Shading model: {:?}", shading);
            self.shading = shading;
        }
    }

    pub fn set_day_night(&mut self, mode: DayNight) {
        if self.day_night != mode {
            info!("Sky: {:?}", mode);
            self.day_night = mode;
        }
    }

    pub fn set_surface(&mut self, surface: SurfaceMode) {
        if self.surface != surface {
            info!("Surface mode: {:?}", surface);
            self.surface = surface;
        }
    }
}
