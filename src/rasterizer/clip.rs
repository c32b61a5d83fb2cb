//! Near-plane clipping in homogeneous clip space
//!
//! Only used with `NearPlane::Clip`. Sutherland–Hodgman against `z >= 0`,
//! then the resulting convex polygon is fanned back into triangles.

use smallvec::SmallVec;
use super::math::Vec4;

/// Vertex attributes carried through clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub clip: Vec4,
    /// 0-255 per channel
    pub color: [f32; 3],
    /// World-space normal
    pub normal: Vec4,
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        ClipVertex {
            clip: self.clip.lerp(other.clip, t),
            color: [
                mix(self.color[0], other.color[0]),
                mix(self.color[1], other.color[1]),
                mix(self.color[2], other.color[2]),
            ],
            normal: self.normal.lerp(other.normal, t).normalize(),
        }
    }
}

#[inline]
fn inside_near(v: &ClipVertex) -> bool {
    v.clip.z >= 0.0
}

/// Point where the edge a -> b crosses z = 0
#[inline]
fn intersect_near(a: &ClipVertex, b: &ClipVertex) -> ClipVertex {
    let t = a.clip.z / (a.clip.z - b.clip.z);
    let mut v = a.lerp(b, t);
    v.clip.z = 0.0;
    v
}

/// Clip a triangle against the near plane.
///
/// Returns no triangle when it is entirely in front of the plane, the input
/// untouched when entirely behind, and one or two triangles otherwise.
pub fn clip_triangle_near(tri: &[ClipVertex; 3]) -> SmallVec<[[ClipVertex; 3]; 2]> {
    let mut out_tris: SmallVec<[[ClipVertex; 3]; 2]> = SmallVec::new();

    if tri.iter().all(inside_near) {
        out_tris.push(*tri);
        return out_tris;
    }

    let mut polygon: SmallVec<[ClipVertex; 4]> = SmallVec::new();
    for i in 0..3 {
        let curr = &tri[i];
        let prev = &tri[(i + 2) % 3];
        match (inside_near(prev), inside_near(curr)) {
            (true, true) => polygon.push(*curr),
            (false, true) => {
                polygon.push(intersect_near(prev, curr));
                polygon.push(*curr);
            }
            (true, false) => polygon.push(intersect_near(prev, curr)),
            (false, false) => {}
        }
    }

    if polygon.len() < 3 {
        return out_tris;
    }
    let v0 = polygon[0];
    for i in 1..polygon.len() - 1 {
        out_tris.push([v0, polygon[i], polygon[i + 1]]);
    }
    out_tris
}
