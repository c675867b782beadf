//! Progress reporting for pack and unpack runs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Progress reporter backed by indicatif.
///
/// When disabled, all operations are no-ops so library callers pay nothing
/// for an unused reporter.
#[derive(Clone)]
pub struct ProgressReporter {
    enabled: bool,
    bar: Option<Arc<ProgressBar>>,
}

impl ProgressReporter {
    /// Create a reporter. Pass `enabled = false` for silent operation.
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a disabled reporter.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether progress output is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the main progress bar with a known item count.
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(message.to_string());
        self.bar = Some(Arc::new(bar));
    }

    /// Advance the main bar by one item.
    pub fn tick(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Replace the bar's message.
    pub fn set_message(&self, message: String) {
        if let Some(bar) = &self.bar {
            bar.set_message(message);
        }
    }

    /// Finish the bar with a closing message.
    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::disabled()
    }
}
