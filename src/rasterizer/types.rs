//! Core types for the rasterizer

use serde::{Serialize, Deserialize};
use super::math::Vec4;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale RGB by a light intensity, clamped to 0.0-1.0; alpha is kept
    pub fn shade(self, intensity: f32) -> Self {
        let i = intensity.clamp(0.0, 1.0);
        Self { a: self.a, ..Self::from_rgb_f32(self.to_rgb_f32().map(|c| c * i)) }
    }

    /// Channels as floats in 0-255, used for interpolation
    pub fn to_rgb_f32(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Inverse of [`Color::to_rgb_f32`], rounding to the nearest byte
    pub fn from_rgb_f32(rgb: [f32; 3]) -> Self {
        let to_u8 = |c: f32| c.round().clamp(0.0, 255.0) as u8;
        Self::new(to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]))
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A vertex with position, normal and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position, w = 1
    pub pos: Vec4,
    /// Normal, w = 0
    pub normal: Vec4,
    pub color: Color,
    /// Carried for mesh loaders; never sampled
    pub uv: Option<(f32, f32)>,
}

impl Vertex {
    pub fn new(pos: Vec4, normal: Vec4, color: Color) -> Self {
        Self {
            pos: Vec4 { w: 1.0, ..pos },
            normal: normal.as_direction(),
            color,
            uv: None,
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = Some((u, v));
        self
    }
}

/// Three vertices and an optional flat face color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v: [Vertex; 3],
    /// When set, replaces the interpolated vertex colors
    pub face_color: Option<Color>,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self { v: [v0, v1, v2], face_color: None }
    }

    /// Unnormalized face normal `(v1 - v0) x (v2 - v0)`
    pub fn face_normal(&self) -> Vec4 {
        (self.v[1].pos - self.v[0].pos).cross(self.v[2].pos - self.v[0].pos)
    }
}

/// Shading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Raw vertex / face colors
    #[default]
    Unlit,
    /// One light calculation per face
    Flat,
    /// Light calculation per pixel from the interpolated normal
    Smooth,
}

/// What to do with triangles crossing the near plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NearPlane {
    /// Drop the triangle if any vertex is in front of the near plane.
    /// Cheap, but triangles pop out as they reach the camera.
    #[default]
    Cull,
    /// Clip against the near plane and re-triangulate the remainder
    Clip,
}

/// Render option flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Draw triangle outlines instead of filling them
    pub wireframe: bool,
    /// Discard triangles facing away from the camera
    pub backface_cull: bool,
    /// Draw a short line along each vertex normal
    pub show_normals: bool,
    pub near_plane: NearPlane,
    pub shading: ShadingMode,
    /// Direction the light travels (world space)
    pub light_dir: [f32; 3],
    /// Ambient light intensity (0.0-1.0)
    pub ambient: f32,
    pub clear_color: Color,
    pub wire_color: Color,
    pub normal_color: Color,
    /// World-space length of the drawn normals
    pub normal_length: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wireframe: false,
            backface_cull: true,
            show_normals: false,
            near_plane: NearPlane::Cull,
            shading: ShadingMode::Unlit,
            light_dir: [-1.0, 1.0, 1.0],
            ambient: 0.3,
            clear_color: Color::new(20, 20, 20),
            wire_color: Color::new(255, 250, 250),
            normal_color: Color::YELLOW,
            normal_length: 0.2,
        }
    }
}

impl RenderOptions {
    /// Normalized light direction as a `Vec4` direction
    pub fn light(&self) -> Vec4 {
        Vec4::from_array(self.light_dir, 0.0).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_forces_homogeneous_w() {
        let v = Vertex::new(Vec4::new(1.0, 2.0, 3.0, 7.0), Vec4::new(0.0, 1.0, 0.0, 1.0), Color::RED);
        assert_eq!(v.pos.w, 1.0);
        assert_eq!(v.normal.w, 0.0);
    }

    #[test]
    fn test_color_round_trip_rounds() {
        let c = Color::from_rgb_f32([82.875, 86.06, 254.6]);
        assert_eq!(c, Color::new(83, 86, 255));
    }

    #[test]
    fn test_shade_clamps() {
        assert_eq!(Color::WHITE.shade(2.0), Color::WHITE);
        assert_eq!(Color::WHITE.shade(-1.0), Color::BLACK);
    }

    #[test]
    fn test_shade_rounds_and_keeps_alpha() {
        let c = Color::with_alpha(255, 100, 3, 40).shade(0.5);
        assert_eq!(c, Color::with_alpha(128, 50, 2, 40));
    }
}
