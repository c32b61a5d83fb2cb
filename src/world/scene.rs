//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files. A scene
//! describes the frame size, the camera, the frustum, the render flags and a
//! list of models to place in the world.

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::error::SceneError;
use crate::rasterizer::{Camera, Color, Frustum, RenderOptions, Vec4, HEIGHT, WIDTH};
use super::mesh::{triangle_with_face_normals, Mesh};
use super::model::Model;

/// Largest frame side accepted; keeps sizes within what a texture upload takes
pub const MAX_DIMENSION: usize = 8192;

fn default_up() -> [f32; 3] {
    // World +y maps to screen down
    [0.0, 1.0, 0.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn white() -> [Color; 3] {
    [Color::WHITE; 3]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    #[serde(default = "default_up")]
    pub up: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrustumConfig {
    /// Horizontal field of view in degrees
    pub fov: f32,
    /// Defaults to width / height
    #[serde(default)]
    pub aspect: Option<f32>,
    pub near: f32,
    pub far: f32,
}

/// Triangle given inline in the scene file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleConfig {
    pub positions: [[f32; 3]; 3],
    #[serde(default = "white")]
    pub colors: [Color; 3],
    #[serde(default)]
    pub face_color: Option<Color>,
    /// Texture coordinates, carried through to the vertices
    #[serde(default)]
    pub uvs: Option<[(f32, f32); 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeshSource {
    UnitCube,
    Triangles(Vec<TriangleConfig>),
}

impl MeshSource {
    pub fn build(&self) -> Mesh {
        match self {
            MeshSource::UnitCube => Mesh::unit_cube(),
            MeshSource::Triangles(tris) => tris
                .iter()
                .map(|t| {
                    let mut tri = triangle_with_face_normals(t.positions, t.colors);
                    tri.face_color = t.face_color;
                    if let Some(uvs) = t.uvs {
                        for (vert, (u, v)) in tri.v.iter_mut().zip(uvs) {
                            *vert = vert.with_uv(u, v);
                        }
                    }
                    tri
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub mesh: MeshSource,
    #[serde(default)]
    pub position: [f32; 3],
    /// Degrees about X, Y, Z
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Degrees per second about the model's own X, Y, Z
    #[serde(default)]
    pub spin: [f32; 3],
}

/// A model plus its per-second local rotation
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub model: Model,
    /// Radians per second
    pub spin: [f32; 3],
}

impl SceneObject {
    /// Advance the spin by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if self.spin != [0.0; 3] {
            self.model.rotate(self.spin[0] * dt, self.spin[1] * dt, self.spin[2] * dt);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub camera: CameraConfig,
    pub frustum: FrustumConfig,
    #[serde(default)]
    pub options: RenderOptions,
    pub models: Vec<ModelConfig>,
}

impl Default for SceneConfig {
    /// A spinning cube in front of a camera at the origin
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            camera: CameraConfig {
                eye: [0.0, 0.0, 0.0],
                target: [0.0, 0.0, 1.0],
                up: default_up(),
            },
            frustum: FrustumConfig {
                fov: 90.0,
                aspect: None,
                near: 1.0,
                far: 20.0,
            },
            options: RenderOptions::default(),
            models: vec![ModelConfig {
                mesh: MeshSource::UnitCube,
                position: [0.0, 0.0, 3.0],
                rotation: [25.0, 0.0, 0.0],
                scale: unit_scale(),
                spin: [0.0, 50.0, 0.0],
            }],
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 || self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(SceneError::InvalidSize { width: self.width, height: self.height });
        }
        let f = &self.frustum;
        if !(f.near > 0.0 && f.far > f.near) {
            return Err(SceneError::InvalidFrustum(format!(
                "need 0 < near < far, got near {} far {}",
                f.near, f.far
            )));
        }
        if !(f.fov > 0.0 && f.fov < 180.0) {
            return Err(SceneError::InvalidFrustum(format!("fov {} out of (0, 180)", f.fov)));
        }
        if matches!(f.aspect, Some(a) if a <= 0.0) {
            return Err(SceneError::InvalidFrustum("aspect must be positive".to_string()));
        }

        // look_at needs a view direction and an up vector off that direction
        let c = &self.camera;
        let forward = Vec4::from_array(c.target, 0.0) - Vec4::from_array(c.eye, 0.0);
        let up = Vec4::from_array(c.up, 0.0);
        if forward.len() < 1e-6 {
            return Err(SceneError::InvalidCamera("eye and target coincide".to_string()));
        }
        if up.len() < 1e-6 || up.normalize().cross(forward.normalize()).len() < 1e-4 {
            return Err(SceneError::InvalidCamera(format!(
                "up {:?} is parallel to the view direction",
                c.up
            )));
        }
        Ok(())
    }

    pub fn camera(&self) -> Camera {
        Camera::new(
            Vec4::from_array(self.camera.eye, 1.0),
            Vec4::from_array(self.camera.target, 1.0),
            Vec4::from_array(self.camera.up, 0.0),
        )
    }

    pub fn frustum(&self) -> Frustum {
        let f = &self.frustum;
        let aspect = f.aspect.unwrap_or(self.width as f32 / self.height as f32);
        Frustum::new(f.fov, aspect, f.near, f.far)
    }

    /// Instantiate every model, converting degrees to radians
    pub fn build_objects(&self) -> Vec<SceneObject> {
        self.models
            .iter()
            .map(|m| SceneObject {
                model: Model::new(m.mesh.build(), m.position, m.rotation.map(f32::to_radians), m.scale),
                spin: m.spin.map(f32::to_radians),
            })
            .collect()
    }
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneConfig, SceneError> {
    let contents = fs::read_to_string(path)?;
    load_scene_from_str(&contents)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &SceneConfig, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<SceneConfig, SceneError> {
    let scene: SceneConfig = ron::from_str(s)?;
    scene.validate()?;
    log::info!("scene: {}x{}, {} model(s)", scene.width, scene.height, scene.models.len());
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::NearPlane;

    const SCENE: &str = r#"
        (
            width: 320,
            height: 240,
            camera: (eye: (0.0, 0.0, -2.0), target: (0.0, 0.0, 0.0)),
            frustum: (fov: 75.0, near: 0.5, far: 50.0),
            options: (wireframe: true, near_plane: Clip),
            models: [
                (mesh: UnitCube, position: (0.0, 0.0, 1.0), spin: (0.0, 90.0, 0.0)),
                (
                    mesh: Triangles([
                        (
                            positions: ((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)),
                            face_color: Some((r: 10, g: 20, b: 30)),
                            uvs: Some(((0.0, 0.0), (1.0, 0.0), (0.0, 1.0))),
                        ),
                    ]),
                ),
            ],
        )
    "#;

    #[test]
    fn test_parse_scene() {
        let scene = load_scene_from_str(SCENE).unwrap();
        assert_eq!((scene.width, scene.height), (320, 240));
        assert!(scene.options.wireframe);
        assert_eq!(scene.options.near_plane, NearPlane::Clip);
        // Unlisted options keep their defaults
        assert!(scene.options.backface_cull);
        assert_eq!(scene.camera.up, [0.0, 1.0, 0.0]);

        let frustum = scene.frustum();
        assert!((frustum.aspect - 320.0 / 240.0).abs() < 1e-6);

        let objects = scene.build_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].model.mesh().len(), 12);
        assert!((objects[0].spin[1] - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let tri = objects[1].model.mesh().get(0).unwrap();
        assert_eq!(tri.face_color, Some(Color::new(10, 20, 30)));
        assert_eq!(tri.v[2].color, Color::WHITE);
        assert_eq!(tri.v[1].uv, Some((1.0, 0.0)));
    }

    #[test]
    fn test_invalid_frustum_rejected() {
        let bad = SCENE.replace("near: 0.5, far: 50.0", "near: 5.0, far: 1.0");
        assert!(matches!(load_scene_from_str(&bad), Err(SceneError::InvalidFrustum(_))));
    }

    #[test]
    fn test_camera_without_view_direction_rejected() {
        let bad = SCENE.replace("target: (0.0, 0.0, 0.0)", "target: (0.0, 0.0, -2.0)");
        assert!(matches!(load_scene_from_str(&bad), Err(SceneError::InvalidCamera(_))));
    }

    #[test]
    fn test_top_down_camera_needs_other_up() {
        let top_down = SCENE.replace(
            "camera: (eye: (0.0, 0.0, -2.0), target: (0.0, 0.0, 0.0))",
            "camera: (eye: (0.0, -5.0, 0.0), target: (0.0, 0.0, 0.0))",
        );
        assert!(matches!(load_scene_from_str(&top_down), Err(SceneError::InvalidCamera(_))));

        let fixed = SCENE.replace(
            "camera: (eye: (0.0, 0.0, -2.0), target: (0.0, 0.0, 0.0))",
            "camera: (eye: (0.0, -5.0, 0.0), target: (0.0, 0.0, 0.0), up: (0.0, 0.0, 1.0))",
        );
        let scene = load_scene_from_str(&fixed).unwrap();
        let view = scene.camera().view_matrix();
        assert!((view.determinant() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let bad = SCENE.replace("width: 320", "width: 70000");
        assert!(matches!(
            load_scene_from_str(&bad),
            Err(SceneError::InvalidSize { width: 70000, height: 240 })
        ));
    }

    #[test]
    fn test_syntax_error_reported() {
        assert!(matches!(load_scene_from_str("(width: 3"), Err(SceneError::Parse(_))));
    }

    #[test]
    fn test_default_scene_round_trips() {
        let scene = SceneConfig::default();
        scene.validate().unwrap();
        let text = ron::ser::to_string(&scene).unwrap();
        let back = load_scene_from_str(&text).unwrap();
        assert_eq!(back.models.len(), 1);
        assert_eq!(back.frustum.near, 1.0);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("impromptu-scene-{}.ron", std::process::id()));
        let mut scene = SceneConfig::default();
        scene.options.show_normals = true;
        save_scene(&scene, &path).unwrap();

        let back = load_scene(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert!(back.options.show_normals);
        assert_eq!(back.models[0].spin, [0.0, 50.0, 0.0]);
    }

    #[test]
    fn test_spin_rotates_model() {
        let mut objects = SceneConfig::default().build_objects();
        let before = *objects[0].model.model_to_world();
        objects[0].update(0.5);
        assert_ne!(*objects[0].model.model_to_world(), before);
    }
}
