//! Progress reporting for long-running import operations
//!
//! Background removal and keyword search can take seconds per item. The
//! importer reports each stage through a `ProgressReporter` so frontends can
//! show a spinner while library users stay silent by default.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Stages an item passes through while being imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportStage {
    /// Reading and decoding an uploaded file
    Decoding,
    /// Querying the image search provider
    Searching,
    /// Downloading the chosen search hit
    Downloading,
    /// Removing the image background
    RemovingBackground,
    /// Item appended to the layer list
    Added,
}

impl ImportStage {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Decoding => "Decoding image",
            Self::Searching => "Searching images",
            Self::Downloading => "Downloading image",
            Self::RemovingBackground => "Removing background",
            Self::Added => "Added to collage",
        }
    }
}

/// A single progress event for one source (file name or keyword)
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub stage: ImportStage,
    pub source: String,
    /// 1-based position of this source in the batch
    pub index: usize,
    pub total: usize,
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "[{}/{}] {}: {}",
            self.index,
            self.total,
            self.source,
            self.stage.description()
        )
    }
}

/// Receives progress events from the importer
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, update: ProgressUpdate);

    /// Called once per batch with the number of added and failed sources
    fn report_completion(&self, added: usize, failed: usize, elapsed_ms: u64);

    fn report_error(&self, source: &str, error: &str);
}

/// Discards all progress events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _added: usize, _failed: usize, _elapsed_ms: u64) {}

    fn report_error(&self, _source: &str, _error: &str) {}
}

/// Emits progress as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        tracing::info!(elapsed_ms = update.elapsed_ms, "{}", update.message());
    }

    fn report_completion(&self, added: usize, failed: usize, elapsed_ms: u64) {
        tracing::info!(
            "✅ Import finished: {} added, {} failed in {}ms",
            added,
            failed,
            elapsed_ms
        );
    }

    fn report_error(&self, source: &str, error: &str) {
        tracing::warn!(source = %source, "⚠️ Could not import: {}", error);
    }
}

/// Tracks batch position and elapsed time for one import call
pub struct ProgressTracker<'a> {
    reporter: &'a dyn ProgressReporter,
    total: usize,
    current: AtomicUsize,
    start: Instant,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(reporter: &'a dyn ProgressReporter, total: usize) -> Self {
        Self {
            reporter,
            total,
            current: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }

    /// Advance to the next source in the batch
    pub fn next_item(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_stage(&self, stage: ImportStage, source: &str) {
        self.reporter.report_progress(ProgressUpdate {
            stage,
            source: source.to_string(),
            index: self.current.load(Ordering::Relaxed).max(1),
            total: self.total,
            elapsed_ms: self.elapsed_ms(),
        });
    }

    pub fn report_error(&self, source: &str, error: &str) {
        self.reporter.report_error(source, error);
    }

    pub fn report_completion(&self, added: usize, failed: usize) {
        self.reporter
            .report_completion(added, failed, self.elapsed_ms());
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
