//! Impromptu: a small CPU software rasterizer
//!
//! Triangles go through a model -> world -> camera -> clip -> screen
//! cascade and land in an RGBA framebuffer that any presenter can upload.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod error;
pub mod rasterizer;
pub mod world;
