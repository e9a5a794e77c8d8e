pub mod assets;
pub mod camera;
pub mod camera_rig;
pub mod layout;
pub mod light;
pub mod light_rig;
pub mod primitives;
pub mod state;
pub mod texture;
