//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{HookwireConfig, LogFormat, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HookwireConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        let Some(path) = &logging.file_path else {
            return Err(ConfigError::missing_field("logging.file_path"));
        };
        if path.file_name().is_none() {
            return Err(ConfigError::validation(format!(
                "Log file path has no file name: {}",
                path.display()
            )));
        }
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "JSON log format requires the `json-log` feature",
        ));
    }

    for module in logging.filters.keys() {
        if module.trim().is_empty() || module.contains([' ', ',', '=']) {
            return Err(ConfigError::validation(format!(
                "Invalid module in logging.filters: {module:?}"
            )));
        }
    }

    Ok(())
}
