use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or driving a scene.
///
/// Geometry and camera errors are raised at load time or when a camera is
/// mutated; asset decode errors are normally recovered by the loader with a
/// placeholder texture and only surface from the low-level decode call.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("degenerate camera basis: {0}")]
    DegenerateCamera(&'static str),

    #[error("triangle list has {0} vertices, expected a multiple of 3")]
    TriangleList(usize),

    #[error("vertex buffer of {len} bytes does not fit stride {stride}")]
    VertexBuffer { len: usize, stride: usize },

    #[error("failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to load OBJ '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("window error: {0}")]
    Window(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
