pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str, validate_config};
pub use schema::{
    Config, EndpointConfig, PreviewConfig, RunConfig, ValidationConfig, DEFAULT_CATEGORIES,
    DEFAULT_FALLBACK_CATEGORY, MAX_BATCH_SIZE,
};
