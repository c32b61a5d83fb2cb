//! Software rasterizer
//!
//! Features:
//! - Homogeneous 4x4 transform algebra (row-major, column vectors)
//! - Backface and frustum culling, optional near-plane clipping
//! - Edge-function triangle fill with a depth buffer
//! - Unlit, flat and Gouraud shading
//! - Bresenham wireframes and vertex-normal overlays
//!
//! Coordinates are left-handed: +x right, +y down, +z into the screen.

mod math;
mod types;
mod buffer;
mod clip;
mod pipeline;
mod render;

pub use math::*;
pub use types::*;
pub use buffer::*;
pub use pipeline::*;
pub use render::*;

/// Default frame dimensions
pub const WIDTH: usize = 640;
pub const HEIGHT: usize = 480;
