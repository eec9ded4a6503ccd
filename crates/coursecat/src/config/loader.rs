use std::path::Path;

use crate::config::schema::{Config, MAX_BATCH_SIZE};
use crate::error::ConfigError;
use crate::pipeline::validation::CategoryVocabulary;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks that the schema cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.endpoint.url.trim().is_empty() {
        return Err(invalid("endpoint.url must not be empty"));
    }
    if config.endpoint.timeout_secs == 0 {
        return Err(invalid("endpoint.timeout_secs must be positive"));
    }

    config.retry.validate()?;

    let run = &config.run;
    if run.batch_size == 0 || run.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation {
            message: format!(
                "run.batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, run.batch_size
            ),
        });
    }
    if run.progress_interval == 0 {
        return Err(invalid("run.progress_interval must be positive"));
    }
    if !(run.success_threshold > 0.0 && run.success_threshold <= 1.0) {
        return Err(ConfigError::Validation {
            message: format!(
                "run.success_threshold must be in (0, 1], got {}",
                run.success_threshold
            ),
        });
    }
    if run.lock_ttl_secs == 0 {
        return Err(invalid("run.lock_ttl_secs must be positive"));
    }
    if run.category_version.trim().is_empty() {
        return Err(invalid("run.category_version must not be empty"));
    }

    if config.preview.sample_size == 0 {
        return Err(invalid("preview.sample_size must be positive"));
    }

    CategoryVocabulary::from_config(&config.validation)?;

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
