//! Service layer shared by the library API and the CLI frontend

pub mod progress;

pub use progress::{
    ImportStage, NoOpProgressReporter, ProgressReporter, ProgressTracker, ProgressUpdate,
    TracingProgressReporter,
};
