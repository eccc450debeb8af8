use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use lensless_core::pipeline::{PipelineStage, ProgressReporter};

/// Spinner showing the current pipeline stage.
pub struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg} {elapsed:.dim}")?,
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerReporter {
    fn begin_stage(&self, stage: PipelineStage) {
        self.bar.set_message(stage.to_string());
    }

    fn finish_stage(&self) {
        let msg = self.bar.message();
        if !msg.is_empty() {
            self.bar.println(format!("  \u{2713} {msg}"));
        }
    }
}
