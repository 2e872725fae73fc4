use std::fmt::Display;

/// Frame time statistics with a decaying running average, so that the
/// reported number settles quickly after startup but still smooths out
/// scheduling noise.
#[derive(Clone, PartialEq, Debug)]
pub struct FrameStats {
    pub frames: usize,
    pub min_ms: f32,
    pub max_ms: f32,
    avg_ms: f32,
    alpha: f32,
}

impl FrameStats {
    pub fn add_frame(&mut self, elapsed_ms: f32) {
        self.frames += 1;
        self.min_ms = self.min_ms.min(elapsed_ms);
        self.max_ms = self.max_ms.max(elapsed_ms);
        self.avg_ms = (1.0 - self.alpha) * self.avg_ms + self.alpha * elapsed_ms;
        if self.alpha > 0.05 {
            self.alpha *= 0.75;
        }
    }

    /// Running average frame time in milliseconds.
    pub fn avg_ms(&self) -> f32 {
        self.avg_ms
    }

    pub fn fps(&self) -> f32 {
        1000.0 / self.avg_ms
    }

    /// Primary rays per second, in millions, for the given pixel count.
    pub fn mrays_per_s(&self, pixels: u32) -> f32 {
        pixels as f32 / self.avg_ms / 1000.0
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        FrameStats {
            frames: 0,
            min_ms: f32::INFINITY,
            max_ms: 0.0,
            avg_ms: 0.0,
            // the first sample replaces the average completely
            alpha: 1.0,
        }
    }
}

impl Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:5.2}ms ({:.1}fps); {:.2} - {:.2}ms over {} frames",
            self.avg_ms,
            self.fps(),
            self.min_ms,
            self.max_ms,
            self.frames
        )
    }
}
