//! CLI-specific progress handling for butterfly-net
//!
//! One spinner per pipeline stage, drawn on stderr.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Creates a spinner for a stage of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner wrapper for one pipeline stage
pub struct StageProgress {
    pub pb: ProgressBar,
}

impl StageProgress {
    /// Start a stage; draws nothing when `hidden` is set
    pub fn start(message: &str, hidden: bool) -> Self {
        let pb = if hidden {
            ProgressBar::hidden()
        } else {
            create_spinner(message)
        };
        Self { pb }
    }

    pub fn finish(self, message: impl Into<String>) {
        self.pb.finish_with_message(message.into());
    }

    pub fn abandon(self) {
        self.pb.abandon();
    }
}
