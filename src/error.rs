//! Error types
//!
//! One enum per subsystem, derived with `thiserror`. None of these are meant
//! to end the process: a failing model degrades a frame, a bad scene file
//! falls back to the built-in scene.

use thiserror::Error;

/// Linear algebra failures
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    /// The determinant is too close to zero to divide by
    #[error("singular matrix (determinant {det})")]
    Singular { det: f32 },
}

/// Failures while pushing a model through the pipeline
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RenderError {
    #[error("model transform: {0}")]
    Math(#[from] MathError),
}

/// Scene file loading and saving
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("invalid frame size {width}x{height}")]
    InvalidSize { width: usize, height: usize },

    #[error("invalid frustum: {0}")]
    InvalidFrustum(String),

    #[error("invalid camera: {0}")]
    InvalidCamera(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
