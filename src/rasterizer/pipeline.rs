//! Geometry transform cascade
//!
//! model -> world -> camera -> clip -> NDC -> screen, one triangle at a time.
//! Culling happens as early as possible: backfaces in world space, the
//! frustum in clip space before the perspective divide.

use smallvec::{smallvec, SmallVec};
use super::clip::{clip_triangle_near, ClipVertex};
use super::math::{Mat4, Vec4};
use super::types::{Color, NearPlane, RenderOptions, Triangle};
use crate::error::RenderResult;

/// `w` magnitude below which a vertex cannot be divided safely
pub const W_EPSILON: f32 = 1e-6;

/// Camera pose for one frame. Owned by whoever drives the camera.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec4,
    pub target: Vec4,
    pub up: Vec4,
}

impl Camera {
    pub fn new(eye: Vec4, target: Vec4, up: Vec4) -> Self {
        Self {
            eye: Vec4 { w: 1.0, ..eye },
            target: Vec4 { w: 1.0, ..target },
            up: up.as_direction(),
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.eye, self.target, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec4::ORIGIN, Vec4::point(0.0, 0.0, 1.0), Vec4::UP)
    }
}

/// Perspective frustum parameters
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Horizontal field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self { fov, aspect, near, far }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }
}

/// Clip-space plane a triangle was rejected against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullPlane {
    Left,
    Right,
    Top,
    Bottom,
    Near,
    Far,
}

/// What happened to one input triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleOutcome {
    /// Produced this many screen-space triangles
    Visible(usize),
    Backface,
    Frustum(CullPlane),
    Degenerate,
}

/// Vertex ready for rasterization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    /// x, y in pixels, z = depth in [0, 1], w = clip-space w before the divide
    pub pos: Vec4,
    /// 0-255 per channel
    pub color: [f32; 3],
    /// World-space unit normal
    pub normal: Vec4,
}

/// Triangle in screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTriangle {
    pub v: [ScreenVertex; 3],
    pub face_color: Option<Color>,
    /// World-space unit face normal, pointing out of the visible side
    pub face_normal: Vec4,
}

impl ScreenTriangle {
    /// Triangle straight from screen coordinates, mostly for direct drawing
    pub fn from_points(points: [(f32, f32, f32); 3], colors: [Color; 3]) -> Self {
        let vertex = |i: usize| ScreenVertex {
            pos: Vec4::new(points[i].0, points[i].1, points[i].2, 1.0),
            color: colors[i].to_rgb_f32(),
            normal: Vec4::ZERO,
        };
        Self {
            v: [vertex(0), vertex(1), vertex(2)],
            face_color: None,
            face_normal: Vec4::ZERO,
        }
    }
}

/// Frustum test on clip-space positions.
///
/// The other planes only reject a triangle when all three vertices are out
/// on the same side. The near plane is stricter under [`NearPlane::Cull`]:
/// a single vertex with `z < 0` is enough, which keeps w away from zero
/// for the divide at the price of popping near the camera.
pub fn frustum_cull(clip: &[Vec4; 3], near_plane: NearPlane) -> Option<CullPlane> {
    let all = |f: fn(&Vec4) -> bool| clip.iter().all(f);

    if all(|v| v.x < -v.w) {
        return Some(CullPlane::Left);
    }
    if all(|v| v.x > v.w) {
        return Some(CullPlane::Right);
    }
    if all(|v| v.y < -v.w) {
        return Some(CullPlane::Top);
    }
    if all(|v| v.y > v.w) {
        return Some(CullPlane::Bottom);
    }
    if all(|v| v.z > v.w) {
        return Some(CullPlane::Far);
    }

    let near_out = match near_plane {
        NearPlane::Cull => clip.iter().any(|v| v.z < 0.0),
        NearPlane::Clip => all(|v| v.z < 0.0),
    };
    if near_out {
        return Some(CullPlane::Near);
    }
    None
}

/// Per-model transform state for one frame
pub struct TransformPipeline {
    model_to_world: Mat4,
    normal_matrix: Mat4,
    view_projection: Mat4,
    viewport: Mat4,
    eye: Vec4,
}

impl TransformPipeline {
    /// Fails when the model matrix cannot be inverted for its normals
    pub fn new(
        model_to_world: &Mat4,
        camera: &Camera,
        frustum: &Frustum,
        width: usize,
        height: usize,
    ) -> RenderResult<Self> {
        Ok(Self {
            model_to_world: *model_to_world,
            normal_matrix: model_to_world.inverse_transpose()?,
            view_projection: frustum.projection_matrix() * camera.view_matrix(),
            viewport: Mat4::viewport(width, height),
            eye: camera.eye,
        })
    }

    pub fn to_world(&self, pos: Vec4) -> Vec4 {
        self.model_to_world * pos
    }

    pub fn normal_to_world(&self, normal: Vec4) -> Vec4 {
        (self.normal_matrix * normal).as_direction().normalize()
    }

    /// World point to screen, or None if it lies in front of the near plane
    pub fn project_point(&self, world: Vec4) -> Option<Vec4> {
        let clip = self.view_projection * world;
        if clip.z < 0.0 || clip.w.abs() < W_EPSILON {
            return None;
        }
        Some(self.to_screen(clip))
    }

    fn to_screen(&self, clip: Vec4) -> Vec4 {
        let ndc = Vec4::point(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
        Vec4 { w: clip.w, ..self.viewport * ndc }
    }

    /// Push one model-space triangle through the cascade, appending whatever
    /// survives to `out`.
    pub fn process(
        &self,
        tri: &Triangle,
        options: &RenderOptions,
        out: &mut Vec<ScreenTriangle>,
    ) -> TriangleOutcome {
        let world = tri.v.map(|v| self.to_world(v.pos));

        let face_normal = (world[1] - world[0]).cross(world[2] - world[0]);
        if options.backface_cull {
            let to_camera = self.eye - world[0];
            if face_normal.dot(to_camera) >= 0.0 {
                return TriangleOutcome::Backface;
            }
        }

        let clip = world.map(|w| self.view_projection * w);
        if let Some(plane) = frustum_cull(&clip, options.near_plane) {
            return TriangleOutcome::Frustum(plane);
        }

        let clip_vertices: [ClipVertex; 3] = std::array::from_fn(|i| ClipVertex {
            clip: clip[i],
            color: tri.v[i].color.to_rgb_f32(),
            normal: self.normal_to_world(tri.v[i].normal),
        });

        let pieces: SmallVec<[[ClipVertex; 3]; 2]> = match options.near_plane {
            NearPlane::Cull => smallvec![clip_vertices],
            NearPlane::Clip => clip_triangle_near(&clip_vertices),
        };

        // The winding cross product points into the solid; light needs the outside
        let face_normal = -face_normal.normalize();
        let mut produced = 0;
        for piece in &pieces {
            if piece.iter().any(|v| v.clip.w.abs() < W_EPSILON) {
                log::trace!("skipping triangle with w ~ 0 after culling");
                continue;
            }
            let v = piece.map(|cv| ScreenVertex {
                pos: self.to_screen(cv.clip),
                color: cv.color,
                normal: cv.normal,
            });
            out.push(ScreenTriangle {
                v,
                face_color: tri.face_color,
                face_normal,
            });
            produced += 1;
        }

        if produced == 0 {
            TriangleOutcome::Degenerate
        } else {
            TriangleOutcome::Visible(produced)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::types::Vertex;

    fn pipeline() -> TransformPipeline {
        TransformPipeline::new(
            &Mat4::IDENTITY,
            &Camera::default(),
            &Frustum::new(90.0, 1.0, 1.0, 10.0),
            100,
            100,
        )
        .unwrap()
    }

    fn tri(points: [[f32; 3]; 3]) -> Triangle {
        let v = |p: [f32; 3]| Vertex::new(Vec4::from_array(p, 1.0), Vec4::direction(0.0, 0.0, -1.0), Color::WHITE);
        Triangle::new(v(points[0]), v(points[1]), v(points[2]))
    }

    fn no_cull() -> RenderOptions {
        RenderOptions { backface_cull: false, ..RenderOptions::default() }
    }

    #[test]
    fn test_cull_all_left() {
        let clip = [
            Vec4::new(-3.0, 0.0, 0.5, 1.0),
            Vec4::new(-2.0, 0.5, 0.5, 1.0),
            Vec4::new(-5.0, -0.5, 0.5, 2.0),
        ];
        assert_eq!(frustum_cull(&clip, NearPlane::Cull), Some(CullPlane::Left));
    }

    #[test]
    fn test_straddling_side_plane_kept() {
        let clip = [
            Vec4::new(-3.0, 0.0, 0.5, 1.0),
            Vec4::new(0.0, 0.0, 0.5, 1.0),
            Vec4::new(-5.0, 0.0, 0.5, 2.0),
        ];
        assert_eq!(frustum_cull(&clip, NearPlane::Cull), None);
    }

    #[test]
    fn test_single_near_vertex_culls_whole_triangle() {
        let clip = [
            Vec4::new(0.0, 0.0, -0.1, 0.9),
            Vec4::new(0.5, 0.0, 0.5, 2.0),
            Vec4::new(0.0, 0.5, 0.5, 2.0),
        ];
        assert_eq!(frustum_cull(&clip, NearPlane::Cull), Some(CullPlane::Near));
        assert_eq!(frustum_cull(&clip, NearPlane::Clip), None);
    }

    #[test]
    fn test_all_far_culled() {
        let clip = [
            Vec4::new(0.0, 0.0, 3.0, 2.0),
            Vec4::new(0.5, 0.0, 3.0, 2.0),
            Vec4::new(0.0, 0.5, 3.0, 2.0),
        ];
        assert_eq!(frustum_cull(&clip, NearPlane::Cull), Some(CullPlane::Far));
    }

    #[test]
    fn test_visible_triangle_reaches_screen() {
        let p = pipeline();
        let mut out = Vec::new();
        let t = tri([[0.0, 0.0, 5.0], [1.0, 0.0, 5.0], [0.0, 1.0, 5.0]]);
        assert_eq!(p.process(&t, &no_cull(), &mut out), TriangleOutcome::Visible(1));

        // Camera looks down +z, so (0,0,5) hits the centre of the screen
        let v0 = out[0].v[0].pos;
        assert!((v0.x - 50.0).abs() < 1e-3);
        assert!((v0.y - 50.0).abs() < 1e-3);
        assert!(v0.z > 0.0 && v0.z < 1.0);
        assert!((v0.w - 5.0).abs() < 1e-4);
        // x = 1 at z = 5 with a 90 degree fov lands at NDC 0.2
        assert!((out[0].v[1].pos.x - 60.0).abs() < 1e-3);
        // Outward normal faces back at the camera
        assert!((out[0].face_normal.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_backface_culled_by_winding() {
        let p = pipeline();
        let opts = RenderOptions::default();
        let mut out = Vec::new();

        // cross((0,1,0), (1,0,0)) = -z, towards a camera at the origin: culled
        let back = tri([[0.0, 0.0, 5.0], [0.0, 1.0, 5.0], [1.0, 0.0, 5.0]]);
        assert_eq!(p.process(&back, &opts, &mut out), TriangleOutcome::Backface);

        let front = tri([[0.0, 0.0, 5.0], [1.0, 0.0, 5.0], [0.0, 1.0, 5.0]]);
        assert_eq!(p.process(&front, &opts, &mut out), TriangleOutcome::Visible(1));
    }

    #[test]
    fn test_near_policy() {
        let p = pipeline();
        let t = tri([[0.0, 0.0, 0.5], [1.0, 0.0, 5.0], [0.0, 1.0, 5.0]]);
        let mut out = Vec::new();

        assert_eq!(p.process(&t, &no_cull(), &mut out), TriangleOutcome::Frustum(CullPlane::Near));
        assert!(out.is_empty());

        let clip = RenderOptions { near_plane: NearPlane::Clip, ..no_cull() };
        assert_eq!(p.process(&t, &clip, &mut out), TriangleOutcome::Visible(2));
        for st in &out {
            for v in &st.v {
                assert!(v.pos.z >= 0.0);
                assert!(v.pos.w >= 1.0 - 1e-4);
            }
        }
    }

    #[test]
    fn test_project_point_rejects_points_before_near() {
        let p = pipeline();
        let on_axis = p.project_point(Vec4::point(0.0, 0.0, 5.0)).unwrap();
        assert!((on_axis.x - 50.0).abs() < 1e-3 && (on_axis.y - 50.0).abs() < 1e-3);
        // Near plane sits at z = 1
        assert_eq!(p.project_point(Vec4::point(0.0, 0.0, 0.5)), None);
    }

    #[test]
    fn test_normals_follow_inverse_transpose() {
        let model = Mat4::scale(1.0, 4.0, 1.0);
        let p = TransformPipeline::new(&model, &Camera::default(), &Frustum::new(90.0, 1.0, 1.0, 10.0), 10, 10)
            .unwrap();
        let n = p.normal_to_world(Vec4::direction(1.0, 1.0, 0.0));
        // Stretching along y flattens the normal towards x
        assert!(n.x > n.y);
        assert!((n.len() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_singular_model_rejected() {
        let flat = Mat4::scale(1.0, 1.0, 0.0);
        let res = TransformPipeline::new(&flat, &Camera::default(), &Frustum::new(90.0, 1.0, 1.0, 10.0), 10, 10);
        assert!(res.is_err());
    }
}
