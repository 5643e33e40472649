use indicatif::{ProgressBar, ProgressStyle};
use mareye_core::pipeline::{PipelineStage, ProgressReporter};

/// Terminal progress bar on stderr. Hidden automatically when stderr is
/// not a terminal.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar().template("{msg:32} [{bar:40}] {pos}/{len}") {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.bar.reset();
        self.bar.set_length(total_items.unwrap_or(0) as u64);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        if self.bar.length() < Some(items_done as u64) {
            self.bar.set_length(items_done as u64);
        }
        self.bar.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        self.bar.tick();
    }
}
