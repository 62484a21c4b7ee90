//! Spinner-based progress display for imports

use crate::services::{ProgressReporter, ProgressUpdate};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Shows one spinner per import batch and a summary line when it ends
#[derive(Default)]
pub(crate) struct SpinnerProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgressReporter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        let spinner = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        f(spinner);
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        self.with_spinner(|spinner| spinner.set_message(update.message()));
    }

    fn report_completion(&self, added: usize, failed: usize, elapsed_ms: u64) {
        self.finish();
        if failed == 0 {
            println!("✅ Added {} item(s) in {:.1}s", added, elapsed_ms as f64 / 1000.0);
        } else {
            println!(
                "⚠️  Added {} item(s), {} failed in {:.1}s",
                added,
                failed,
                elapsed_ms as f64 / 1000.0
            );
        }
    }

    fn report_error(&self, source: &str, error: &str) {
        self.with_spinner(|spinner| spinner.println(format!("❌ {}: {}", source, error)));
    }
}
