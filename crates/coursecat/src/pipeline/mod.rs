//! The categorization pipeline and its maintenance passes.

pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod preview;
pub mod progress;
pub mod runner;
pub mod statistics;
pub mod stats;
pub mod validation;

pub use config::PipelineConfig;
pub use context::RunContext;
pub use control::RunController;
pub use error::PipelineError;
pub use preview::{PreviewItem, MISSING_CATEGORY, UNDETERMINED_CATEGORY};
pub use progress::{FnProgress, NoopProgress, ProgressReporter, ProgressSnapshot};
pub use runner::{Pipeline, NO_CONTENT_MESSAGE, RUN_LOCK};
pub use statistics::{summarize, CategoryStatistics};
pub use stats::{CategorizationOutcome, RecordError, RunResult, RunStatistics};
pub use validation::{CategoryCorrection, CategoryVocabulary, ValidationReport};
