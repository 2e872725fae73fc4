mod machinery;
mod worker;

pub use crate::renderer::machinery::{Progress, RenderProgress, render};

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: std::num::NonZeroU32,
    pub workers: WorkerCount,
}

/// How many render threads to spawn.
#[derive(Copy, Clone, Debug)]
pub enum WorkerCount {
    /// One worker per logical CPU.
    Auto,
    Manual(std::num::NonZeroUsize),
}

impl WorkerCount {
    pub(crate) fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get().max(1),
            WorkerCount::Manual(count) => count.get(),
        }
    }
}
