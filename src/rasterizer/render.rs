//! Triangle rasterization
//!
//! Filled triangles use edge functions over the screen-space bounding box,
//! wireframes use Bresenham lines. Attributes are interpolated linearly in
//! screen space (affine, not perspective-correct): cheap, and slightly off
//! for large triangles seen at steep angles.

use std::ops::AddAssign;
use super::buffer::{DepthBuffer, FrameBuffer};
use super::math::Vec4;
use super::pipeline::{Camera, Frustum, ScreenTriangle, TransformPipeline, TriangleOutcome};
use super::types::{Color, RenderOptions, ShadingMode, Triangle};
use crate::error::RenderResult;
use crate::world::Model;

/// Counters for one `render_model` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Input triangles
    pub submitted: usize,
    pub backface_culled: usize,
    pub frustum_culled: usize,
    /// Dropped for w ~ 0 or zero screen area
    pub degenerate: usize,
    /// Screen-space triangles handed to the fill or wireframe stage
    pub rasterized: usize,
    pub pixels_written: usize,
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, other: FrameStats) {
        self.submitted += other.submitted;
        self.backface_culled += other.backface_culled;
        self.frustum_culled += other.frustum_culled;
        self.degenerate += other.degenerate;
        self.rasterized += other.rasterized;
        self.pixels_written += other.pixels_written;
    }
}

/// Signed area test: which side of the directed edge a -> b the point p is on
#[inline]
pub fn edge(a: Vec4, b: Vec4, px: f32, py: f32) -> f32 {
    (px - a.x) * (b.y - a.y) - (py - a.y) * (b.x - a.x)
}

/// Calculate shading intensity for a normal
fn shade_intensity(normal: Vec4, light: Vec4, ambient: f32) -> f32 {
    let diffuse = normal.dot(-light).max(0.0);
    (ambient + (1.0 - ambient) * diffuse).clamp(0.0, 1.0)
}

/// Render context: owns the color and depth buffers for a fixed resolution
pub struct Rasterizer {
    frame: FrameBuffer,
    depth: DepthBuffer,
    width: usize,
    height: usize,
    scratch: Vec<ScreenTriangle>,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: FrameBuffer::new(width, height),
            depth: DepthBuffer::new(width, height),
            width,
            height,
            scratch: Vec::new(),
        }
    }

    /// The finished image, ready for presentation
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Clear color and depth; call once per frame before drawing
    pub fn begin_frame(&mut self, clear: Color) {
        self.frame.clear(clear);
        self.depth.clear();
    }

    /// Whole line lies off one side of the buffer
    fn line_outside(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
        let (w, h) = (self.width as i32, self.height as i32);
        (x0 < 0 && x1 < 0) || (y0 < 0 && y1 < 0) || (x0 >= w && x1 >= w) || (y0 >= h && y1 >= h)
    }

    /// Draw a line from (x0, y0) to (x1, y1) using Bresenham's algorithm.
    /// Returns the number of pixels that landed inside the buffer.
    ///
    /// Only the stretch of the major axis that overlaps the buffer is
    /// walked; the minor coordinate comes from the closed form of the
    /// Bresenham error term, so far-off endpoints cost nothing extra.
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) -> usize {
        if self.line_outside(x0, y0, x1, y1) {
            return 0;
        }

        let (mut x0, mut y0, mut x1, mut y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = (y1 - y0).abs();
        let step = if y0 < y1 { 1 } else { -1 };
        let major_len = (if steep { self.height } else { self.width }) as i64;
        let first = (-x0).max(0);
        let last = dx.min(major_len - 1 - x0);
        let mut written = 0;

        for n in first..=last {
            // y steps once the accumulated error reaches half a pixel
            let rise = if dx == 0 {
                0
            } else {
                ((2 * n as i128 * dy as i128 + dx as i128) / (2 * dx as i128)) as i64
            };
            let (x, y) = (x0 + n, y0 + step * rise);
            let (px, py) = if steep { (y, x) } else { (x, y) };
            if let (Ok(px), Ok(py)) = (i32::try_from(px), i32::try_from(py)) {
                if self.frame.set_pixel(px, py, color) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Outline a screen-space triangle (no depth test)
    pub fn draw_triangle_wireframe(&mut self, tri: &ScreenTriangle, color: Color) -> usize {
        let p = tri.v.map(|v| (v.pos.x as i32, v.pos.y as i32));
        self.draw_line(p[0].0, p[0].1, p[1].0, p[1].1, color)
            + self.draw_line(p[1].0, p[1].1, p[2].0, p[2].1, color)
            + self.draw_line(p[2].0, p[2].1, p[0].0, p[0].1, color)
    }

    /// Fill a screen-space triangle with depth testing.
    ///
    /// Returns the number of pixels written, or None for a zero-area
    /// triangle. Both windings fill; facing is the pipeline's business.
    /// Pixels exactly on a shared edge are drawn by both neighbours.
    pub fn fill_triangle(&mut self, tri: &ScreenTriangle, options: &RenderOptions) -> Option<usize> {
        let [a, b, c] = tri.v.map(|v| v.pos);

        let area = edge(a, b, c.x, c.y);
        if area == 0.0 || !area.is_finite() {
            log::trace!("skipping zero-area triangle");
            return None;
        }

        // Bounding box
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as i32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(self.width as f32 - 1.0) as i32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as i32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(self.height as f32 - 1.0) as i32;

        let light = options.light();
        let flat_shade = match options.shading {
            ShadingMode::Flat => shade_intensity(tri.face_normal, light, options.ambient),
            _ => 1.0,
        };
        let [c0, c1, c2] = tri.v.map(|v| v.color);
        let mut written = 0;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);

                let w0 = edge(b, c, px, py) / area;
                let w1 = edge(c, a, px, py) / area;
                let w2 = edge(a, b, px, py) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if !self.depth.test_and_set(x, y, z) {
                    continue;
                }

                let base = match tri.face_color {
                    Some(face) => face.to_rgb_f32(),
                    None => std::array::from_fn(|i| w0 * c0[i] + w1 * c1[i] + w2 * c2[i]),
                };

                let shade = match options.shading {
                    ShadingMode::Unlit => 1.0,
                    ShadingMode::Flat => flat_shade,
                    ShadingMode::Smooth => {
                        let n = tri.v[0].normal * w0 + tri.v[1].normal * w1 + tri.v[2].normal * w2;
                        shade_intensity(n.normalize(), light, options.ambient)
                    }
                };

                let color = Color::from_rgb_f32(base).shade(shade);
                if self.frame.set_pixel(x, y, color) {
                    written += 1;
                }
            }
        }
        Some(written)
    }

    /// Fill or outline depending on the wireframe flag
    pub fn draw_triangle(&mut self, tri: &ScreenTriangle, options: &RenderOptions) -> Option<usize> {
        if options.wireframe {
            Some(self.draw_triangle_wireframe(tri, options.wire_color))
        } else {
            self.fill_triangle(tri, options)
        }
    }

    /// Short world-space line along each vertex normal of a triangle
    fn draw_vertex_normals(
        &mut self,
        pipeline: &TransformPipeline,
        tri: &Triangle,
        options: &RenderOptions,
    ) {
        for v in &tri.v {
            let start = pipeline.to_world(v.pos);
            let end = start + pipeline.normal_to_world(v.normal) * options.normal_length;
            if let (Some(s), Some(e)) = (pipeline.project_point(start), pipeline.project_point(end)) {
                self.draw_line(s.x as i32, s.y as i32, e.x as i32, e.y as i32, options.normal_color);
            }
        }
    }

    /// Run every triangle of a model through the pipeline and rasterize what
    /// survives. Fails only when the model matrix is singular.
    pub fn render_model(
        &mut self,
        model: &Model,
        camera: &Camera,
        frustum: &Frustum,
        options: &RenderOptions,
    ) -> RenderResult<FrameStats> {
        let pipeline = TransformPipeline::new(model.model_to_world(), camera, frustum, self.width, self.height)?;

        let mut stats = FrameStats::default();
        let mut screen = std::mem::take(&mut self.scratch);
        screen.clear();
        let mut visible = Vec::new();

        for (idx, tri) in model.mesh().iter().enumerate() {
            stats.submitted += 1;
            match pipeline.process(tri, options, &mut screen) {
                TriangleOutcome::Visible(_) => visible.push(idx),
                TriangleOutcome::Backface => stats.backface_culled += 1,
                TriangleOutcome::Frustum(_) => stats.frustum_culled += 1,
                TriangleOutcome::Degenerate => stats.degenerate += 1,
            }
        }

        for st in &screen {
            match self.draw_triangle(st, options) {
                Some(px) => {
                    stats.rasterized += 1;
                    stats.pixels_written += px;
                }
                None => stats.degenerate += 1,
            }
        }
        self.scratch = screen;

        if options.show_normals {
            for idx in visible {
                if let Some(tri) = model.mesh().get(idx) {
                    self.draw_vertex_normals(&pipeline, tri, options);
                }
            }
        }

        log::debug!("{:?}", stats);
        Ok(stats)
    }
}
