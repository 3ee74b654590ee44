//! Progress reporting.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress of a counted phase (group refresh, downloads).
pub trait ProgressReporter: Send + Sync {
    /// A phase with `total` steps begins.
    fn start(&self, total: u64);

    /// Step `done + 1` of the phase is about to run.
    fn step(&self, done: u64, label: &str);

    /// The phase is over.
    fn finish(&self);
}

/// Progress shown as an `indicatif` bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(prefix: &str) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(item_style(prefix));
        Self { bar }
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn step(&self, done: u64, label: &str) {
        self.bar.set_position(done);
        self.bar.set_message(label.to_string());
    }

    fn finish(&self) {
        let total = self.bar.length().unwrap_or(0);
        self.bar.set_position(total);
        self.bar.finish_and_clear();
    }
}

/// Progress that only goes to the debug log.
#[derive(Debug, Default)]
pub struct QuietProgress;

impl ProgressReporter for QuietProgress {
    fn start(&self, total: u64) {
        tracing::debug!("Starting phase with {} steps", total);
    }

    fn step(&self, done: u64, label: &str) {
        tracing::debug!("[{}] {}", done + 1, label);
    }

    fn finish(&self) {}
}

/// Pick a bar or the quiet reporter.
pub fn create_reporter(show: bool, prefix: &str) -> Box<dyn ProgressReporter> {
    if show {
        Box::new(BarProgress::new(prefix))
    } else {
        Box::new(QuietProgress)
    }
}

fn item_style(prefix: &str) -> ProgressStyle {
    let template = format!(
        "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {{wide_msg}}",
        prefix
    );
    ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}
