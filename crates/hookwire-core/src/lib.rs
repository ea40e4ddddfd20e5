//! # Hookwire Core
//!
//! Data types shared by every layer of the hookwire webhook framework.
//!
//! - **Update model**: the five update shapes a webhook call can produce
//!   ([`Update`], [`UpdateKind`]) and their classification from a JSON
//!   payload ([`Update::from_webhook`]).
//! - **Callback data**: the [`CallbackData`] contract for packing typed values
//!   into button and list-row payloads.
//! - **Errors**: [`DecodeError`], [`EncodeError`] and [`UpdateParseError`].
//!
//! ```text
//! webhook JSON ──▶ Update::from_webhook ──▶ Update ──▶ (hookwire-framework) Dispatcher
//!                                                  │
//!                                callback_data() ──┴──▶ CallbackData::parse_from_string
//! ```

// Lets `#[derive(CallbackData)]` expand to `::hookwire_core::...` inside this crate's tests.
extern crate self as hookwire_core;

pub mod callback;
pub mod error;
pub mod update;

pub use callback::{
    CALLBACK_SEP, CallbackData, FIELD_SEP, callback_fields, join_segments, matches_callback_id,
    strip_callback_id,
};
#[cfg(feature = "derive")]
pub use hookwire_macros::CallbackData;

pub use error::{DecodeError, DecodeResult, EncodeError, ParseResult, UpdateParseError};
pub use update::{
    CallbackButton, CallbackSelection, Location, Media, Message, MessageStatus,
    MessageStatusType, MessageType, Metadata, RawUpdate, Reaction, ReplyToMessage, StatusError,
    Update, UpdateKind, UpdateMeta, User,
};
