use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoursecatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Categorization error: {0}")]
    Categorize(#[from] crate::categorizer::CategorizeError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid retry policy: {reason}")]
    InvalidRetryPolicy { reason: String },

    #[error("Invalid category vocabulary: {reason}")]
    InvalidVocabulary { reason: String },
}

pub type Result<T> = std::result::Result<T, CoursecatError>;
