//! Terminal progress display for generation requests

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static SPINNER_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
});

/// Spinner shown while a batch is sampled, rendered and committed
///
/// Sampling and rendering happen inside one critical section with no
/// intermediate progress events, so the display is a spinner with a status
/// message rather than a bar.
pub struct GenerationProgress {
    bar: ProgressBar,
}

impl GenerationProgress {
    /// Spinner drawn to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(SPINNER_STYLE.clone());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Spinner that draws nothing, for quiet runs and tests
    pub fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        bar.set_style(SPINNER_STYLE.clone());
        Self { bar }
    }

    /// Announce the batch being generated
    pub fn start(&self, tiles: usize, world_size: usize) {
        self.bar
            .set_message(format!("generating {tiles} tiles against {world_size} existing"));
    }

    /// Current status message
    pub fn message(&self) -> String {
        self.bar.message()
    }

    /// Stop the spinner, leaving a final message
    pub fn finish(&self, message: String) {
        self.bar.finish_with_message(message);
    }

    /// Stop and erase the spinner
    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }

    /// Whether the spinner has been stopped
    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}
