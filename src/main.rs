//! Impromptu viewer: renders a scene on the CPU and shows the framebuffer
//! in a macroquad window.
//!
//! Controls:
//! - WASD / Shift / Space: move the first model in world space
//! - 1: toggle wireframe
//! - 2: toggle backface culling
//! - 3: toggle vertex normals

use clap::Parser;
use impromptu::rasterizer::{FrameStats, Rasterizer};
use impromptu::world::{load_scene, SceneConfig};
use impromptu::VERSION;
use macroquad::prelude::*;
use std::path::PathBuf;

/// World units per second for keyboard movement
const MOVE_SPEED: f32 = 2.0;

#[derive(Parser, Debug)]
#[command(name = "impromptu", about = "CPU software rasterizer viewer")]
struct Args {
    /// RON scene file; the built-in spinning cube is used when absent
    #[arg(long)]
    scene: Option<PathBuf>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Impromptu v{}", VERSION),
        window_width: impromptu::rasterizer::WIDTH as i32,
        window_height: impromptu::rasterizer::HEIGHT as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn scene_from_args(args: &Args) -> SceneConfig {
    match &args.scene {
        Some(path) => match load_scene(path) {
            Ok(scene) => {
                println!("Loaded scene {}", path.display());
                scene
            }
            Err(e) => {
                eprintln!("Failed to load scene {}: {}, using the default", path.display(), e);
                SceneConfig::default()
            }
        },
        None => SceneConfig::default(),
    }
}

/// Keyboard movement for one frame, in world units
fn movement(dt: f32) -> [f32; 3] {
    let step = MOVE_SPEED * dt;
    let mut d = [0.0; 3];
    if is_key_down(KeyCode::W) {
        d[2] += step;
    }
    if is_key_down(KeyCode::S) {
        d[2] -= step;
    }
    if is_key_down(KeyCode::A) {
        d[0] -= step;
    }
    if is_key_down(KeyCode::D) {
        d[0] += step;
    }
    // +y is down on screen
    if is_key_down(KeyCode::Space) {
        d[1] -= step;
    }
    if is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift) {
        d[1] += step;
    }
    d
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();
    let scene = scene_from_args(&args);

    let camera = scene.camera();
    let frustum = scene.frustum();
    let mut options = scene.options.clone();
    let mut objects = scene.build_objects();
    let mut rasterizer = Rasterizer::new(scene.width, scene.height);

    println!("=== Impromptu ===");
    println!("{}x{}, {} model(s)", scene.width, scene.height, objects.len());

    // Scene sizes are capped at MAX_DIMENSION, well inside u16
    let (fb_w, fb_h) = (rasterizer.frame().width(), rasterizer.frame().height());
    let texture = Texture2D::from_rgba8(fb_w as u16, fb_h as u16, rasterizer.frame().as_bytes());
    texture.set_filter(FilterMode::Nearest);

    loop {
        let dt = get_frame_time();

        if is_key_pressed(KeyCode::Key1) {
            options.wireframe = !options.wireframe;
        }
        if is_key_pressed(KeyCode::Key2) {
            options.backface_cull = !options.backface_cull;
        }
        if is_key_pressed(KeyCode::Key3) {
            options.show_normals = !options.show_normals;
        }

        let [dx, dy, dz] = movement(dt);
        if let Some(first) = objects.first_mut() {
            if dx != 0.0 || dy != 0.0 || dz != 0.0 {
                first.model.translate(dx, dy, dz);
            }
        }
        for obj in &mut objects {
            obj.update(dt);
        }

        rasterizer.begin_frame(options.clear_color);
        let mut stats = FrameStats::default();
        for (i, obj) in objects.iter().enumerate() {
            match rasterizer.render_model(&obj.model, &camera, &frustum, &options) {
                Ok(s) => stats += s,
                Err(e) => eprintln!("model {} skipped: {}", i, e),
            }
        }

        texture.update_from_bytes(fb_w as u32, fb_h as u32, rasterizer.frame().as_bytes());

        // Letterbox the framebuffer into the window
        let screen_w = screen_width();
        let screen_h = screen_height();
        let scale = (screen_w / fb_w as f32).min(screen_h / fb_h as f32);
        let draw_w = fb_w as f32 * scale;
        let draw_h = fb_h as f32 * scale;

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            (screen_w - draw_w) * 0.5,
            (screen_h - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        draw_text(
            &format!(
                "{} fps | tris {}/{} | back {} | frustum {} | [1] wire {} [2] cull {} [3] normals {}",
                get_fps(),
                stats.rasterized,
                stats.submitted,
                stats.backface_culled,
                stats.frustum_culled,
                options.wireframe,
                options.backface_cull,
                options.show_normals,
            ),
            8.0,
            18.0,
            16.0,
            Color::from_rgba(200, 200, 200, 255),
        );

        next_frame().await;
    }
}
