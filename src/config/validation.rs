//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};
use regex::Regex;

/// Upper bound for the retry count.
const MAX_RETRY_ATTEMPTS: u32 = 20;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_output_directory(config)?;
    validate_client_secrets(config)?;

    for id in &config.options.course_ids {
        validate_remote_id("course_ids", id)?;
    }
    for id in &config.options.material_ids {
        validate_remote_id("material_ids", id)?;
    }

    validate_retry(config)?;

    Ok(())
}

/// The output root must be a directory or not exist yet.
fn validate_output_directory(config: &Config) -> Result<()> {
    let output = config.output_directory();
    if output.exists() && !output.is_dir() {
        return Err(Error::ConfigValidation {
            field: "output_directory".to_string(),
            message: format!("'{}' exists and is not a directory", output.display()),
        });
    }
    Ok(())
}

/// Client secrets must exist before any network work starts.
fn validate_client_secrets(config: &Config) -> Result<()> {
    let path = config.client_secrets_path();
    if !path.is_file() {
        return Err(Error::MissingConfig(format!(
            "client_secrets (OAuth client file not found at {})",
            path.display()
        )));
    }
    Ok(())
}

fn validate_retry(config: &Config) -> Result<()> {
    let retry = &config.retry;

    if retry.max_attempts > MAX_RETRY_ATTEMPTS {
        return Err(Error::ConfigValidation {
            field: "retry.max_attempts".to_string(),
            message: format!(
                "At most {} retries allowed (got {})",
                MAX_RETRY_ATTEMPTS, retry.max_attempts
            ),
        });
    }

    if retry.backoff_multiplier < 1.0 || !retry.backoff_multiplier.is_finite() {
        return Err(Error::ConfigValidation {
            field: "retry.backoff_multiplier".to_string(),
            message: format!("Must be at least 1.0 (got {})", retry.backoff_multiplier),
        });
    }

    if retry.initial_delay_ms > retry.max_delay_ms {
        return Err(Error::ConfigValidation {
            field: "retry.initial_delay_ms".to_string(),
            message: "Initial delay cannot exceed max_delay_ms".to_string(),
        });
    }

    Ok(())
}

/// Validate a Classroom/Drive identifier used as a filter.
pub fn validate_remote_id(field: &str, id: &str) -> Result<()> {
    let id_pattern = Regex::new(r"^[A-Za-z0-9_-]{1,128}$")
        .map_err(|e| Error::Config(format!("Invalid id pattern: {}", e)))?;

    if !id_pattern.is_match(id) {
        return Err(Error::ConfigValidation {
            field: field.to_string(),
            message: format!(
                "'{}' is not a valid identifier. Only alphanumeric, hyphens, and underscores allowed.",
                id
            ),
        });
    }

    Ok(())
}
