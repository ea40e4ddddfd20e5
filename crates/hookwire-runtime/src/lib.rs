//! # Hookwire Runtime
//!
//! Runtime layer of the hookwire webhook dispatcher.
//!
//! This crate provides:
//! - Layered configuration ([`ConfigLoader`], [`HookwireConfig`])
//! - Logging setup ([`LoggingBuilder`], [`SpanEvents`])
//! - [`WebhookRuntime`], which owns a client context and a shared handler
//!   registry and accepts raw webhook bodies
//!
//! ```rust,ignore
//! use hookwire_runtime::{ConfigLoader, WebhookRuntime};
//!
//! let runtime = WebhookRuntime::from_loader(Bot::default(), ConfigLoader::new())?;
//! let _guard = runtime.init_logging();
//! runtime.add_handler(Handler::message(echo));
//!
//! // From the HTTP handler:
//! let report = runtime.handle_bytes(&body)?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, HookwireConfig, LoggingConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingGuard, SpanEvents};
pub use runtime::WebhookRuntime;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
