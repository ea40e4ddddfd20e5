//! Error types shared by the update model and the callback-data contract.
//!
//! Dispatch-level errors (invalid factories, kind mismatches) live in
//! `hookwire-framework`.

use thiserror::Error;

// =============================================================================
// Callback Data Errors
// =============================================================================

/// Errors raised while turning a raw callback string into typed values.
///
/// Decoding never happens inside the dispatch core itself; these errors reach
/// whoever calls a resolved decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The callback string does not start with the expected type identifier.
    #[error("callback data '{data}' does not carry identifier '{expected}'")]
    IdMismatch {
        /// Identifier the structured type expects.
        expected: &'static str,
        /// The offending callback string.
        data: String,
    },

    /// A structured value received the wrong number of fields.
    #[error("expected {expected} field(s), got {actual}")]
    FieldCount {
        /// Number of fields the type declares.
        expected: usize,
        /// Number of fields found in the payload.
        actual: usize,
    },

    /// A single field failed its own parsing rules.
    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidField {
        /// Field name (or position for tuple structs).
        field: &'static str,
        /// Raw field text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A positional payload split into the wrong number of segments.
    #[error("expected {expected} callback segment(s), got {actual}")]
    SegmentCount {
        /// Number of positional sub-decoders.
        expected: usize,
        /// Number of segments after splitting on the separator.
        actual: usize,
    },

    /// A positional sub-decoder failed.
    #[error("segment {index}: {source}")]
    Segment {
        /// Zero-based position of the failing segment.
        index: usize,
        /// The sub-decoder's error.
        #[source]
        source: Box<DecodeError>,
    },

    /// Free-form error from a user-supplied decoder.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Creates a custom decode error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an invalid-field error from any displayable parser error.
    pub fn invalid_field(
        field: &'static str,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Wraps this error with the position of the segment that produced it.
    pub fn at_segment(self, index: usize) -> Self {
        Self::Segment {
            index,
            source: Box::new(self),
        }
    }
}

/// Errors raised while rendering a structured value into its callback string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A field value contains one of the reserved separator characters.
    #[error("field {index} ('{value}') contains a reserved callback separator")]
    ReservedSeparator {
        /// Zero-based field position.
        index: usize,
        /// The offending value.
        value: String,
    },
}

// =============================================================================
// Update Parsing Errors
// =============================================================================

/// Errors that can occur while classifying a webhook payload.
#[derive(Debug, Error)]
pub enum UpdateParseError {
    /// The payload did not match the expected wire shape.
    #[error("malformed webhook payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A required part of the payload is absent.
    #[error("webhook payload is missing '{0}'")]
    Missing(&'static str),

    /// A status string outside the known set.
    #[error("unknown message status '{0}'")]
    UnknownStatus(String),

    /// A timestamp that is not a decimal unix time.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for callback decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for webhook classification.
pub type ParseResult<T> = Result<T, UpdateParseError>;
