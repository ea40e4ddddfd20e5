//! Error types for the dispatch core.

use hookwire_core::{UpdateKind, UpdateParseError};
use thiserror::Error;

/// Raised while building a callback handler from an unusable factory.
///
/// Always raised at construction time, never during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFactorySpecError {
    /// A positional sequence without any element.
    #[error("a positional factory sequence needs at least one element")]
    EmptySequence,

    /// A structured type whose identifier is the empty string.
    #[error("structured type '{type_name}' has an empty callback identifier")]
    EmptyCallbackId {
        /// Rust type name of the structured type.
        type_name: &'static str,
    },

    /// A structured type whose identifier contains a reserved separator.
    #[error("callback identifier '{callback_id}' of '{type_name}' contains a reserved separator")]
    ReservedSeparator {
        /// Rust type name of the structured type.
        type_name: &'static str,
        /// The offending identifier.
        callback_id: &'static str,
    },
}

/// Errors produced by the dispatcher itself rather than by user code.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler was invoked with an update of another kind.
    #[error("handler for '{expected}' updates received a '{got}' update")]
    KindMismatch {
        /// The handler's routing tag.
        expected: UpdateKind,
        /// The update's kind.
        got: UpdateKind,
    },

    /// The webhook payload could not be classified.
    #[error(transparent)]
    InvalidPayload(#[from] UpdateParseError),
}

/// Result type for factory resolution.
pub type FactoryResult<T> = Result<T, InvalidFactorySpecError>;

/// Returned by [`UpdatePredicate`](crate::service::UpdatePredicate) when an
/// update does **not** pass its filter.
#[derive(Debug, Clone, Error)]
#[error("update skipped by filter")]
pub struct UpdateSkipped;
