pub mod backend;
pub mod compositor;
pub mod passes;
pub mod recording;
pub mod renderer;
pub mod shaders;
pub mod software;
pub mod uniforms;
