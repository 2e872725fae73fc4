mod camera;
pub mod geometry;
mod renderer;
pub mod scene;
mod screen_block;
pub mod tracer;
pub mod util;

pub use crate::renderer::{Progress, RenderProgress, RenderSettings, WorkerCount, render};
pub use camera::Camera;
pub use scene::Scene;
pub use screen_block::ScreenBlock;
