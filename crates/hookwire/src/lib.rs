//! # Hookwire
//!
//! Type-safe dispatch of chat-platform webhook events.
//!
//! A webhook body becomes one [`Update`](core::Update) of five kinds. Each
//! registered handler belongs to one kind, carries an ordered list of filters
//! evaluated left to right, and, for button clicks and list selections, a
//! callback-data factory that decodes the payload string into typed values.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────────────────┐
//! │ HTTP handler │────▶│ WebhookRuntime │────▶│ Dispatcher                   │
//! │ (yours)      │     │ config + ctx   │     │  RawUpdate bucket            │
//! └──────────────┘     └────────────────┘     │  Message / CallbackButton /  │
//!                                             │  CallbackSelection / Status  │
//!                                             └──────────────────────────────┘
//!                                                 │ per handler:
//!                                                 ▼ derived filter ▶ filters ▶ decode ▶ callback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookwire::prelude::*;
//!
//! #[derive(CallbackData)]
//! #[callback(id = "vote", crate = "hookwire::core")]
//! struct Vote {
//!     poll: u32,
//!     choice: String,
//! }
//!
//! let runtime = WebhookRuntime::new(Bot::default());
//! let vote = runtime.callback_button_handler(
//!     |bot: &Bot, _click, value| {
//!         if let Some(vote) = value.single::<Vote>() {
//!             bot.count(vote);
//!         }
//!     },
//!     FactorySpec::structured::<Vote>(),
//! )?;
//! runtime.add_handler(vote);
//! runtime.handle_bytes(&body)?;
//! ```
//!
//! When deriving through this crate, point the macro at the re-export with
//! `#[callback(crate = "hookwire::core")]`.
//!
//! ## Features
//!
//! - `derive` *(default)*: `#[derive(CallbackData)]`
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use hookwire_core as core;
pub use hookwire_framework as framework;
pub use hookwire_runtime as runtime;

/// Commonly used types for building a webhook bot.
///
/// ```rust,ignore
/// use hookwire::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use hookwire_runtime::{ConfigLoader, HookwireConfig, WebhookRuntime};

    // Update model
    pub use hookwire_core::{
        CallbackButton, CallbackSelection, Message, MessageStatus, MessageStatusType, RawUpdate,
        Update, UpdateKind,
    };

    // Structured callback data
    pub use hookwire_core::CallbackData;

    // Handlers, filters and factories
    pub use hookwire_framework::{
        DecodeCallback, DecodedValue, DispatchReport, Dispatcher, ErrorPolicy, FactoryElement,
        FactorySpec, Filter, Handler, HandlerKind, PlainDecoder, ResolveOptions, filters,
    };
}
