use std::{
    ops::Deref as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

use image::{GenericImage, GenericImageView, RgbaImage};

use crate::{
    camera::Camera,
    renderer::{RenderSettings, worker::Worker},
    scene::Scene,
    screen_block::ScreenBlock,
};

/// Starts rendering one frame on a pool of pinned worker threads and
/// returns a handle to the running render.
///
/// Workers pull tiles from a shared counter until the frame is done. The
/// callbacks fire on worker threads, once per tile.
pub fn render<
    F1: Fn(ScreenBlock) + Send + Sync + 'static,
    F2: Fn(ScreenBlock, Progress) + Send + Sync + 'static,
>(
    scene: Arc<Scene>,
    camera: Camera,
    settings: RenderSettings,
    started_tile_callback: F1,
    finished_tile_callback: F2,
) -> anyhow::Result<RenderProgress> {
    let accumulator = RgbaImage::new(camera.get_resolution().x, camera.get_resolution().y);
    let state = Arc::new(RenderState {
        scene,
        camera,
        accumulator: Mutex::new(accumulator),

        tile_ordering: ScreenBlock::from_size(camera.get_resolution())
            .tile_ordering(settings.tile_size),
        next_tile_index: AtomicUsize::new(0),
    });
    let started_tile_callback = Arc::new(started_tile_callback);
    let finished_tile_callback = Arc::new(finished_tile_callback);

    let cores = core_affinity::get_core_ids()
        .ok_or_else(|| anyhow::anyhow!("Cannot enumerate CPU cores"))?
        .into_iter()
        .take(settings.workers.resolve())
        .enumerate();

    let threads = cores
        .map(|(worker_id, core)| {
            let state = Arc::clone(&state);
            let started_tile_callback = Arc::clone(&started_tile_callback);
            let finished_tile_callback = Arc::clone(&finished_tile_callback);

            thread::Builder::new()
                .name(format!("worker{worker_id}"))
                .spawn(move || {
                    core_affinity::set_for_current(core);

                    let worker = Worker::new(worker_id);
                    let mut buffer =
                        RgbaImage::new(settings.tile_size.into(), settings.tile_size.into());

                    while let Some(tile) = state.get_next_tile() {
                        (started_tile_callback)(*tile);

                        worker.render_tile(&state.scene, &state.camera, tile, &mut buffer);
                        state
                            .accumulator
                            .lock()
                            .expect("Poisoned lock!")
                            .copy_from(
                                buffer.view(0, 0, tile.width(), tile.height()).deref(),
                                tile.min.x,
                                tile.min.y,
                            )
                            .unwrap_or_else(|_| {
                                unreachable!("The buffer should always fit into the output")
                            });

                        (finished_tile_callback)(*tile, state.progress());
                    }
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RenderProgress {
        render_state: state,
        threads,
    })
}

#[derive(Copy, Clone, Debug)]
pub struct Progress {
    pub finished: usize,
    pub total: usize,
}

pub struct RenderProgress {
    render_state: Arc<RenderState>,
    threads: Vec<JoinHandle<()>>,
}

impl RenderProgress {
    pub fn progress(&self) -> Progress {
        self.render_state.progress()
    }

    pub fn progress_percent(&self) -> f32 {
        let Progress { finished, total } = self.progress();
        100.0 * (finished as f32) / (total as f32)
    }

    pub fn is_finished(&self) -> bool {
        self.threads.iter().all(|handle| handle.is_finished())
    }

    /// Signal the workers to abort.
    /// Any running workers will still finish their tiles, but no new ones will be started.
    pub fn abort(&self) {
        self.render_state
            .next_tile_index
            .store(self.render_state.tile_ordering.len(), Ordering::Release);
    }

    /// Wait for the workers to finish.
    pub fn wait(&mut self) {
        self.threads
            .drain(..)
            .for_each(|handle| handle.join().unwrap());
    }

    pub fn image(&self) -> &Mutex<RgbaImage> {
        &self.render_state.accumulator
    }

    /// Waits for the workers and takes the finished frame out of the
    /// render state.
    pub fn resolve_image(mut self) -> RgbaImage {
        self.wait();
        match Arc::try_unwrap(self.render_state) {
            Ok(state) => state.accumulator.into_inner().expect("Poisoned lock!"),
            Err(state) => state.accumulator.lock().expect("Poisoned lock!").clone(),
        }
    }
}

struct RenderState {
    scene: Arc<Scene>,
    camera: Camera,

    accumulator: Mutex<RgbaImage>,

    tile_ordering: Vec<ScreenBlock>,
    next_tile_index: AtomicUsize,
}

impl RenderState {
    fn get_next_tile(&self) -> Option<&ScreenBlock> {
        let id = self.next_tile_index.fetch_add(1, Ordering::AcqRel);
        self.tile_ordering.get(id)
    }

    fn progress(&self) -> Progress {
        let total = self.tile_ordering.len();
        let finished = self.next_tile_index.load(Ordering::Acquire).min(total);
        Progress { finished, total }
    }
}
