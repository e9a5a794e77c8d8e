use crate::error::{RenderError, Result};
use crate::scene::camera::Projection;
use crate::scene::camera_rig::CameraRigLayout;
use crate::scene::layout::SceneLayout;
use crate::scene::light::{Attenuation, LightColor, SpotCone};
use crate::scene::light_rig::{LightRigParams, SpotAim};
use crate::ui::input::ScriptedKey;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub headless: HeadlessConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn projection(&self) -> Projection {
        Projection::new(
            self.camera.fov,
            self.window.width,
            self.window.height,
            self.camera.near,
            self.camera.far,
        )
    }
}

// --- [window] ---

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Supersampling factor per axis.
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            title: default_title(),
        }
    }
}

fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_samples() -> usize {
    1
}
fn default_title() -> String {
    "skylit".to_string()
}

// --- [camera] ---

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_static_position")]
    pub static_position: [f32; 3],
    #[serde(default = "default_static_forward")]
    pub static_forward: [f32; 3],
    #[serde(default = "default_tracking_position")]
    pub tracking_position: [f32; 3],
    #[serde(default = "default_tracking_target")]
    pub tracking_target: [f32; 3],
    #[serde(default = "default_chase_offset")]
    pub chase_offset: [f32; 3],
    #[serde(default = "default_chase_focus")]
    pub chase_focus: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
            static_position: default_static_position(),
            static_forward: default_static_forward(),
            tracking_position: default_tracking_position(),
            tracking_target: default_tracking_target(),
            chase_offset: default_chase_offset(),
            chase_focus: default_chase_focus(),
        }
    }
}

impl CameraConfig {
    pub fn rig_layout(&self) -> CameraRigLayout {
        CameraRigLayout {
            static_position: Point3::from(self.static_position),
            static_forward: Vector3::from(self.static_forward),
            tracking_position: Point3::from(self.tracking_position),
            tracking_initial_target: Point3::from(self.tracking_target),
            chase_offset: Point3::from(self.chase_offset),
            chase_focus: Point3::from(self.chase_focus),
        }
    }
}

fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}
fn default_static_position() -> [f32; 3] {
    [0.0, 2.0, 8.0]
}
fn default_static_forward() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}
fn default_tracking_position() -> [f32; 3] {
    [10.0, 2.0, -3.0]
}
fn default_tracking_target() -> [f32; 3] {
    [0.0, 3.0, 8.0]
}
fn default_chase_offset() -> [f32; 3] {
    [0.0, 2.0, 11.0]
}
fn default_chase_focus() -> [f32; 3] {
    [0.0, 0.0, 3.0]
}

// --- [scene] ---

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
    #[serde(default = "default_shininess")]
    pub shininess: f32,
    #[serde(default = "default_moving_amplitude")]
    pub moving_amplitude: [f32; 3],
    #[serde(default = "default_moving_spin")]
    pub moving_spin_deg: f32,
    #[serde(default = "default_static_positions")]
    pub static_positions: Vec<[f32; 3]>,
    #[serde(default = "default_static_axis")]
    pub static_axis: [f32; 3],
    #[serde(default = "default_static_step")]
    pub static_step_deg: f32,
    #[serde(default = "default_sphere_position")]
    pub sphere_position: [f32; 3],
    #[serde(default = "default_sphere_radius")]
    pub sphere_radius: f32,
    #[serde(default = "default_sphere_sectors")]
    pub sphere_sectors: u32,
    #[serde(default = "default_sphere_stacks")]
    pub sphere_stacks: u32,
    #[serde(default = "default_floor_half_extent")]
    pub floor_half_extent: f32,
    #[serde(default = "default_floor_height")]
    pub floor_height: f32,
    #[serde(default = "default_floor_uv_repeat")]
    pub floor_uv_repeat: f32,
    /// Replaces the sphere with this mesh when set.
    #[serde(default)]
    pub obj_path: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: default_clear_color(),
            shininess: default_shininess(),
            moving_amplitude: default_moving_amplitude(),
            moving_spin_deg: default_moving_spin(),
            static_positions: default_static_positions(),
            static_axis: default_static_axis(),
            static_step_deg: default_static_step(),
            sphere_position: default_sphere_position(),
            sphere_radius: default_sphere_radius(),
            sphere_sectors: default_sphere_sectors(),
            sphere_stacks: default_sphere_stacks(),
            floor_half_extent: default_floor_half_extent(),
            floor_height: default_floor_height(),
            floor_uv_repeat: default_floor_uv_repeat(),
            obj_path: None,
        }
    }
}

impl SceneConfig {
    pub fn layout(&self) -> SceneLayout {
        SceneLayout {
            moving_amplitude: Vector3::from(self.moving_amplitude),
            moving_spin_deg: self.moving_spin_deg,
            static_positions: self.static_positions.iter().copied().map(Point3::from).collect(),
            static_axis: Vector3::from(self.static_axis),
            static_step_deg: self.static_step_deg,
            sphere_position: Point3::from(self.sphere_position),
        }
    }
}

fn default_clear_color() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}
fn default_shininess() -> f32 {
    32.0
}
fn default_moving_amplitude() -> [f32; 3] {
    [0.0, 0.0, -5.0]
}
fn default_moving_spin() -> f32 {
    50.0
}
fn default_static_positions() -> Vec<[f32; 3]> {
    SceneLayout::default()
        .static_positions
        .iter()
        .map(|p| [p.x, p.y, p.z])
        .collect()
}
fn default_static_axis() -> [f32; 3] {
    [1.0, 0.3, 0.5]
}
fn default_static_step() -> f32 {
    20.0
}
fn default_sphere_position() -> [f32; 3] {
    [-1.0, 2.9, -5.5]
}
fn default_sphere_radius() -> f32 {
    1.0
}
fn default_sphere_sectors() -> u32 {
    36
}
fn default_sphere_stacks() -> u32 {
    18
}
fn default_floor_half_extent() -> f32 {
    20.0
}
fn default_floor_height() -> f32 {
    -0.5
}
fn default_floor_uv_repeat() -> f32 {
    10.0
}

// --- [lights] ---

#[derive(Debug, Clone, Deserialize)]
pub struct LightsConfig {
    #[serde(default = "default_directional_direction")]
    pub directional_direction: [f32; 3],
    #[serde(default = "default_day_ambient")]
    pub day_ambient: f32,
    #[serde(default = "default_night_ambient")]
    pub night_ambient: f32,
    #[serde(default = "default_half")]
    pub directional_diffuse: f32,
    #[serde(default = "default_half")]
    pub directional_specular: f32,

    #[serde(default = "default_static_spot_position")]
    pub static_spot_position: [f32; 3],
    #[serde(default = "default_static_spot_direction")]
    pub static_spot_direction: [f32; 3],
    /// ambient, diffuse, specular
    #[serde(default = "default_static_spot_levels")]
    pub static_spot_levels: [f32; 3],

    #[serde(default = "default_moving_spot_levels")]
    pub moving_spot_levels: [f32; 3],
    /// Emitter-local y and z of the moving spot aim; x comes from the aim control.
    #[serde(default = "default_moving_spot_yz")]
    pub moving_spot_yz: [f32; 2],

    /// constant, linear, quadratic
    #[serde(default = "default_attenuation")]
    pub attenuation: [f32; 3],
    #[serde(default = "default_cutoff")]
    pub cutoff_deg: f32,
    #[serde(default = "default_outer_cutoff")]
    pub outer_cutoff_deg: f32,

    #[serde(default = "default_aim_step")]
    pub aim_step: f32,
    #[serde(default = "default_aim_limit")]
    pub aim_limit: f32,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            directional_direction: default_directional_direction(),
            day_ambient: default_day_ambient(),
            night_ambient: default_night_ambient(),
            directional_diffuse: default_half(),
            directional_specular: default_half(),
            static_spot_position: default_static_spot_position(),
            static_spot_direction: default_static_spot_direction(),
            static_spot_levels: default_static_spot_levels(),
            moving_spot_levels: default_moving_spot_levels(),
            moving_spot_yz: default_moving_spot_yz(),
            attenuation: default_attenuation(),
            cutoff_deg: default_cutoff(),
            outer_cutoff_deg: default_outer_cutoff(),
            aim_step: default_aim_step(),
            aim_limit: default_aim_limit(),
        }
    }
}

impl LightsConfig {
    pub fn params(&self) -> LightRigParams {
        let [sa, sd, ss] = self.static_spot_levels;
        let [ma, md, ms] = self.moving_spot_levels;
        let [c, l, q] = self.attenuation;
        LightRigParams {
            directional_direction: Vector3::from(self.directional_direction),
            day_ambient: self.day_ambient,
            night_ambient: self.night_ambient,
            directional_diffuse: self.directional_diffuse,
            directional_specular: self.directional_specular,
            static_spot_position: Point3::from(self.static_spot_position),
            static_spot_direction: Vector3::from(self.static_spot_direction),
            static_spot_color: LightColor::grey(sa, sd, ss),
            moving_spot_color: LightColor::grey(ma, md, ms),
            moving_spot_local_direction: Vector3::new(
                0.0,
                self.moving_spot_yz[0],
                self.moving_spot_yz[1],
            ),
            attenuation: Attenuation::new(c, l, q),
            cone: SpotCone::from_degrees(self.cutoff_deg, self.outer_cutoff_deg),
        }
    }

    pub fn aim(&self) -> SpotAim {
        SpotAim::new(self.aim_step, self.aim_limit)
    }
}

fn default_directional_direction() -> [f32; 3] {
    [0.0, -1.0, 0.0]
}
fn default_day_ambient() -> f32 {
    0.5
}
fn default_night_ambient() -> f32 {
    0.1
}
fn default_half() -> f32 {
    0.5
}
fn default_static_spot_position() -> [f32; 3] {
    [0.0, 3.0, 7.0]
}
fn default_static_spot_direction() -> [f32; 3] {
    [0.0, -3.0, -7.0]
}
fn default_static_spot_levels() -> [f32; 3] {
    [0.0, 1.0, 1.0]
}
fn default_moving_spot_levels() -> [f32; 3] {
    [0.5, 1.0, 1.0]
}
fn default_moving_spot_yz() -> [f32; 2] {
    [-0.3, 1.0]
}
fn default_attenuation() -> [f32; 3] {
    [1.0, 0.09, 0.032]
}
fn default_cutoff() -> f32 {
    12.5
}
fn default_outer_cutoff() -> f32 {
    15.0
}
fn default_aim_step() -> f32 {
    0.01
}
fn default_aim_limit() -> f32 {
    0.7
}

// --- [assets] ---

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Relative paths below are resolved against this directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_container_diffuse")]
    pub container_diffuse: PathBuf,
    #[serde(default = "default_container_specular")]
    pub container_specular: PathBuf,
    #[serde(default = "default_brick_diffuse")]
    pub brick_diffuse: PathBuf,
    #[serde(default = "default_brick_normal")]
    pub brick_normal: PathBuf,
    #[serde(default = "default_grass")]
    pub grass: PathBuf,
    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    #[serde(default = "default_sky_day")]
    pub sky_day: [PathBuf; 6],
    #[serde(default = "default_sky_night")]
    pub sky_night: [PathBuf; 6],
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            container_diffuse: default_container_diffuse(),
            container_specular: default_container_specular(),
            brick_diffuse: default_brick_diffuse(),
            brick_normal: default_brick_normal(),
            grass: default_grass(),
            sky_day: default_sky_day(),
            sky_night: default_sky_night(),
        }
    }
}

impl AssetsConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_container_diffuse() -> PathBuf {
    PathBuf::from("textures/container2.png")
}
fn default_container_specular() -> PathBuf {
    PathBuf::from("textures/container2_specular.png")
}
fn default_brick_diffuse() -> PathBuf {
    PathBuf::from("textures/brickwall.jpg")
}
fn default_brick_normal() -> PathBuf {
    PathBuf::from("textures/brickwall_normal.jpg")
}
fn default_grass() -> PathBuf {
    PathBuf::from("textures/grass.jpg")
}
fn default_sky_day() -> [PathBuf; 6] {
    ["right", "left", "top", "bottom", "front", "back"]
        .map(|face| PathBuf::from(format!("skyboxes/day/{face}.jpg")))
}
fn default_sky_night() -> [PathBuf; 6] {
    ["posx", "negx", "posy", "negy", "posz", "negz"]
        .map(|face| PathBuf::from(format!("skyboxes/night/{face}.jpg")))
}

// --- [headless] ---

#[derive(Debug, Clone, Deserialize)]
pub struct HeadlessConfig {
    #[serde(default = "default_frames")]
    pub frames: u64,
    /// Simulation seconds per frame.
    #[serde(default = "default_timestep")]
    pub timestep: f32,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Write every n-th frame; 0 writes only the last one.
    #[serde(default = "default_save_every")]
    pub save_every: u64,
    #[serde(default)]
    pub keys: Vec<ScriptedKey>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            timestep: default_timestep(),
            output_dir: default_output_dir(),
            save_every: default_save_every(),
            keys: Vec::new(),
        }
    }
}

fn default_frames() -> u64 {
    120
}
fn default_timestep() -> f32 {
    1.0 / 60.0
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("frames")
}
fn default_save_every() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.scene.static_positions.len(), 8);
        assert_eq!(config.lights.attenuation, [1.0, 0.09, 0.032]);
        assert_eq!(config.assets.sky_night[0], PathBuf::from("skyboxes/night/posx.jpg"));
        assert!(config.headless.keys.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [window]
            width = 320

            [lights]
            night_ambient = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.lights.night_ambient, 0.05);
        assert_eq!(config.lights.day_ambient, 0.5);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(Config::parse("[window"), Err(RenderError::Config(_))));
    }

    #[test]
    fn light_params_match_scene_constants() {
        let params = Config::default().lights.params();
        assert_eq!(params, LightRigParams::default());
    }
}
