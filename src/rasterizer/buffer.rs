//! Frame and depth buffers
//!
//! Both are owned contiguous storage with a fixed size. Every access is
//! bounds-checked; writes outside the buffer are dropped.

use super::types::Color;

/// Depth value meaning "nothing drawn here this frame"
pub const DEPTH_CLEAR: f32 = -1.0;

/// RGBA8 color buffer, row-major, top row first, stride `width * 4`
pub struct FrameBuffer {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some((y as usize * self.width + x as usize) * 4)
        } else {
            None
        }
    }

    /// Returns false when (x, y) is outside the buffer
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
                true
            }
            None => false,
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|idx| {
            let p = &self.pixels[idx..idx + 4];
            Color::with_alpha(p[0], p[1], p[2], p[3])
        })
    }

    /// Raw RGBA8 bytes for presentation
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Per-pixel depth, cleared to [`DEPTH_CLEAR`]
pub struct DepthBuffer {
    depth: Vec<f32>,
    width: usize,
    height: usize,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            depth: vec![DEPTH_CLEAR; width * height],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.depth.fill(DEPTH_CLEAR);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    /// Depth test and write in one step.
    ///
    /// Passes when the slot is unwritten or `z` is not behind the stored
    /// depth; equal depths go to the newcomer.
    pub fn test_and_set(&mut self, x: i32, y: i32, z: f32) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        let stored = self.depth[idx];
        if stored == DEPTH_CLEAR || z <= stored {
            self.depth[idx] = z;
            true
        } else {
            false
        }
    }
}
