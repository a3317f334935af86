//! Configuration validation

use crate::{AppConfig, ChainConfig, ConfigError, Result};
use std::collections::HashMap;

/// Validation error details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration, reporting every problem at once
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let errors = collect_errors(config);

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Every field-level problem in `config`
pub fn collect_errors(config: &AppConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.logging.level) {
        errors.push(e);
    }

    // Generous upper bound; quotes rarely live longer than a few minutes
    if config.executor.deadline_buffer_secs > 600 {
        errors.push(ValidationError::new(
            "executor.deadline_buffer_secs",
            "must be <= 600",
        ));
    }

    if config.metrics.enabled && config.metrics.namespace.is_empty() {
        errors.push(ValidationError::new(
            "metrics.namespace",
            "namespace is required when metrics are enabled",
        ));
    }

    let mut seen_ids: HashMap<u64, &str> = HashMap::new();
    for (chain_name, chain_config) in &config.chains {
        if let Err(e) = validate_chain_config(chain_config) {
            errors.push(ValidationError::new(format!("chains.{chain_name}"), e));
        }

        if let Some(other) = seen_ids.insert(chain_config.chain_id, chain_name) {
            errors.push(ValidationError::new(
                format!("chains.{chain_name}.chain_id"),
                format!(
                    "chain id {} already used by '{other}'",
                    chain_config.chain_id
                ),
            ));
        }
    }

    errors
}

/// Validate a chain configuration
pub fn validate_chain_config(chain: &ChainConfig) -> std::result::Result<(), String> {
    if chain.chain_id == 0 {
        return Err("chain_id must be greater than 0".to_string());
    }

    if chain.inclusion_timeout_secs == 0 {
        return Err("inclusion_timeout_secs must be greater than 0".to_string());
    }

    Ok(())
}

/// Accepts a bare level or a full `EnvFilter` directive list
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    let valid = !level.is_empty()
        && level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or(directive);
            matches!(
                level.trim().to_lowercase().as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            )
        });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(
            "logging.level",
            format!("invalid log level '{level}', must be one of: trace, debug, info, warn, error"),
        ))
    }
}
