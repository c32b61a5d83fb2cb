//! Headless renderer: advances a scene a few frames and writes the final
//! framebuffer to a PNG.

use clap::Parser;
use impromptu::rasterizer::{FrameStats, Rasterizer};
use impromptu::world::{load_scene, SceneConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "snapshot", about = "Render a scene to a PNG without opening a window")]
struct Args {
    /// RON scene file; the built-in spinning cube is used when absent
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Where to write the PNG
    #[arg(long, default_value = "snapshot.png")]
    output: PathBuf,

    /// Frames to simulate before the capture
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Seconds per simulated frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();

    let scene = match &args.scene {
        Some(path) => load_scene(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => SceneConfig::default(),
    };

    let camera = scene.camera();
    let frustum = scene.frustum();
    let mut objects = scene.build_objects();
    let mut rasterizer = Rasterizer::new(scene.width, scene.height);
    let mut stats = FrameStats::default();

    for frame in 0..args.frames.max(1) {
        // The first frame shows the scene as loaded
        if frame > 0 {
            for obj in &mut objects {
                obj.update(args.dt);
            }
        }

        rasterizer.begin_frame(scene.options.clear_color);
        stats = FrameStats::default();
        for (i, obj) in objects.iter().enumerate() {
            match rasterizer.render_model(&obj.model, &camera, &frustum, &scene.options) {
                Ok(s) => stats += s,
                Err(e) => eprintln!("model {i} skipped: {e}"),
            }
        }
    }

    let frame = rasterizer.frame();
    let image = image::RgbaImage::from_raw(frame.width() as u32, frame.height() as u32, frame.as_bytes().to_vec())
        .ok_or_else(|| "framebuffer size does not match the image".to_string())?;
    image
        .save(&args.output)
        .map_err(|e| format!("{}: {e}", args.output.display()))?;

    println!(
        "Wrote {} ({}x{}): {} of {} triangles rasterized, {} pixels",
        args.output.display(),
        scene.width,
        scene.height,
        stats.rasterized,
        stats.submitted,
        stats.pixels_written,
    );
    Ok(())
}
