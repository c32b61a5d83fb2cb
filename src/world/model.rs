//! Models: a mesh placed in the world

use crate::rasterizer::Mat4;
use super::mesh::Mesh;

/// A mesh plus its model-to-world transform.
///
/// The transform is updated in place by the incremental mutators, so the
/// order of calls matters: `translate` works in world units, `rotate` and
/// `scale` work on the model's own axes.
#[derive(Debug, Clone)]
pub struct Model {
    mesh: Mesh,
    model_to_world: Mat4,
}

impl Model {
    /// `Translate * Rotate_xyz * Scale`, rotation in radians
    pub fn new(mesh: Mesh, position: [f32; 3], rotation: [f32; 3], scale: [f32; 3]) -> Self {
        let translate = Mat4::translate(position[0], position[1], position[2]);
        let rotate = Mat4::rotate_xyz(rotation[0], rotation[1], rotation[2]);
        let scale = Mat4::scale(scale[0], scale[1], scale[2]);

        Self {
            mesh,
            model_to_world: translate * (rotate * scale),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn model_to_world(&self) -> &Mat4 {
        &self.model_to_world
    }

    /// Move in world space: `M' = T * M`
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.model_to_world = Mat4::translate(dx, dy, dz) * self.model_to_world;
    }

    /// Rotate about the model's local axes (radians): `M' = M * R`
    pub fn rotate(&mut self, rx: f32, ry: f32, rz: f32) {
        self.model_to_world = self.model_to_world * Mat4::rotate_xyz(rx, ry, rz);
    }

    /// Scale along the model's local axes: `M' = M * S`
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        self.model_to_world = self.model_to_world * Mat4::scale(sx, sy, sz);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec4;
    use std::f32::consts::FRAC_PI_2;

    const TOL: f32 = 1e-5;

    fn near(a: Vec4, b: Vec4) -> bool {
        (a - b).len() < TOL && (a.w - b.w).abs() < TOL
    }

    fn empty_at(position: [f32; 3]) -> Model {
        Model::new(Mesh::default(), position, [0.0; 3], [1.0; 3])
    }

    #[test]
    fn test_construction_order() {
        let m = Model::new(Mesh::default(), [1.0, 2.0, 3.0], [0.0, FRAC_PI_2, 0.0], [2.0, 2.0, 2.0]);
        // Scaled, then rotated about y (x -> -z), then translated
        let p = *m.model_to_world() * Vec4::point(1.0, 0.0, 0.0);
        assert!(near(p, Vec4::point(1.0, 2.0, 1.0)), "{:?}", p);
    }

    #[test]
    fn test_translate_is_world_space() {
        let mut m = empty_at([0.0; 3]);
        m.rotate(0.0, FRAC_PI_2, 0.0);
        m.translate(1.0, 0.0, 0.0);

        // The rotation does not bend the translation
        let origin = *m.model_to_world() * Vec4::ORIGIN;
        assert!(near(origin, Vec4::point(1.0, 0.0, 0.0)), "{:?}", origin);
    }

    #[test]
    fn test_rotate_is_local() {
        let mut m = empty_at([5.0, 0.0, 0.0]);
        m.rotate(0.0, FRAC_PI_2, 0.0);

        // Spins in place instead of orbiting the world origin
        let origin = *m.model_to_world() * Vec4::ORIGIN;
        assert!(near(origin, Vec4::point(5.0, 0.0, 0.0)));
        let tip = *m.model_to_world() * Vec4::point(1.0, 0.0, 0.0);
        assert!(near(tip, Vec4::point(5.0, 0.0, -1.0)), "{:?}", tip);
    }

    #[test]
    fn test_scale_is_local() {
        let mut m = empty_at([5.0, 0.0, 0.0]);
        m.scale(2.0, 2.0, 2.0);

        let origin = *m.model_to_world() * Vec4::ORIGIN;
        assert!(near(origin, Vec4::point(5.0, 0.0, 0.0)));
        let tip = *m.model_to_world() * Vec4::point(1.0, 0.0, 0.0);
        assert!(near(tip, Vec4::point(7.0, 0.0, 0.0)));
    }

    #[test]
    fn test_translate_after_rotate_ignores_rotation() {
        let mut m = empty_at([0.0; 3]);
        m.translate(1.0, 0.0, 0.0);
        m.rotate(0.0, FRAC_PI_2, 0.0);
        m.translate(0.0, 0.0, 1.0);

        // Composed on the local side the second step would have been
        // rotated onto +x and landed at (2, 0, 0)
        let origin = *m.model_to_world() * Vec4::ORIGIN;
        assert!(near(origin, Vec4::point(1.0, 0.0, 1.0)), "{:?}", origin);
    }
}
