//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by [`WebhookRuntime`](crate::WebhookRuntime) outside of
/// handler execution.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A webhook body was not valid JSON.
    #[error("Invalid webhook body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
