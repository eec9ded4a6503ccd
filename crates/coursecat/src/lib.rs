pub mod broadcast;
pub mod categorizer;
pub mod config;
pub mod course;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;

pub use broadcast::RunProgressBroadcaster;
pub use categorizer::{
    categorize_once, CategorizeError, Categorization, CategoryService, HttpCategoryService,
    RetryPolicy,
};
pub use config::{load_config, Config};
pub use course::{CategorySource, CategoryUpdate, ContentPayload, CourseRecord};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, CoursecatError, Result};
pub use pipeline::{
    CategoryStatistics, NoopProgress, Pipeline, PipelineConfig, PipelineError, PreviewItem,
    ProgressReporter, ProgressSnapshot, RunController, RunResult, ValidationReport,
};
pub use store::{CourseStore, SqliteCourseStore, StoreError, WriteBatch};
