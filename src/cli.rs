use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use indicatif::ProgressBar;

use miniwhitted::{
    Camera, RenderSettings, Scene, WorkerCount,
    geometry::ScreenSize,
    render,
    scene::WallTextures,
    util::FrameStats,
};

/// Renders the animated Whitted demo room to image files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Number of animation frames to render
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Scene time advance between frames, in seconds
    #[arg(long, default_value_t = 0.05)]
    time_step: f32,

    #[arg(long, default_value_t = NonZeroU32::new(64).unwrap())]
    tile_size: NonZeroU32,

    /// Worker threads; defaults to one per CPU
    #[arg(long)]
    workers: Option<NonZeroUsize>,

    /// Directory with the wall textures (logo.png, red.png, blue.png)
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Output image path; with multiple frames the frame number is
    /// appended to the file stem
    #[arg(long, default_value = "frame.png")]
    output: PathBuf,
}

fn frame_path(output: &PathBuf, frame: u32, frames: u32) -> PathBuf {
    if frames == 1 {
        return output.clone();
    }
    let stem = output.file_stem().unwrap_or_default().to_string_lossy();
    let extension = output.extension().unwrap_or_default().to_string_lossy();
    output.with_file_name(format!("{stem}_{frame:04}.{extension}"))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let textures = WallTextures::load(&args.assets);
    let mut scene = Arc::new(Scene::standard_room(&textures));
    let camera = Camera::room_view(ScreenSize::new(args.width, args.height));
    let settings = RenderSettings {
        tile_size: args.tile_size,
        workers: match args.workers {
            Some(count) => WorkerCount::Manual(count),
            None => WorkerCount::Auto,
        },
    };

    let mut stats = FrameStats::default();
    for frame in 0..args.frames {
        let bar = ProgressBar::no_length();
        let start = Instant::now();

        let render_progress = render(Arc::clone(&scene), camera, settings, |_| {}, {
            let bar = bar.clone();
            move |_, progress| {
                bar.update(|ps| {
                    ps.set_len(progress.total as u64);
                    ps.set_pos(progress.finished as u64)
                })
            }
        })?;
        let image = render_progress.resolve_image();
        bar.finish_and_clear();

        stats.add_frame(start.elapsed().as_secs_f32() * 1000.0);
        log::info!(
            "frame {frame}: {stats} - {:.1}Mrays/s",
            stats.mrays_per_s(args.width * args.height)
        );

        let path = frame_path(&args.output, frame, args.frames);
        image.save(&path)?;
        log::info!("wrote {}", path.display());

        if frame + 1 < args.frames {
            // the workers are done and dropped their scene handle
            let scene = Arc::get_mut(&mut scene).expect("Render still running!");
            scene.set_time((frame + 1) as f32 * args.time_step);
        }
    }

    Ok(())
}
