//! Structured callback data.
//!
//! Buttons and list rows carry an opaque string that comes back verbatim in
//! the matching [`CallbackButton`](crate::CallbackButton) or
//! [`CallbackSelection`](crate::CallbackSelection) update. This module fixes
//! how typed values are packed into that string.
//!
//! # Wire format
//!
//! ```text
//! vote                 structured value without fields
//! vote¶12¶yes          structured value with two fields
//! vote¶12¶yes~page~3   three positional segments joined by CALLBACK_SEP
//! ```
//!
//! A structured value never contains [`CALLBACK_SEP`], so it always fits in a
//! single positional segment.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookwire_core::CallbackData;
//!
//! #[derive(CallbackData)]
//! #[callback(id = "vote")]
//! struct Vote {
//!     poll: u32,
//!     choice: String,
//! }
//!
//! let raw = Vote { poll: 12, choice: "yes".into() }.to_callback_string()?;
//! assert_eq!(raw, "vote¶12¶yes");
//! ```

use crate::error::{DecodeError, DecodeResult, EncodeError};

/// Separates positional segments, and may directly follow a type identifier.
pub const CALLBACK_SEP: char = '~';

/// Separates the fields of a single structured value.
pub const FIELD_SEP: char = '¶';

/// A payload type that can be packed into, and parsed back from, a callback string.
///
/// Usually derived with `#[derive(CallbackData)]`. Implementors only provide the
/// identifier and the field conversions; the string framing is shared.
pub trait CallbackData: Sized + Send + Sync + 'static {
    /// Unique identifier written in front of every encoded value.
    const CALLBACK_ID: &'static str;

    /// Builds a value from its already split fields.
    fn from_fields(fields: &[&str]) -> DecodeResult<Self>;

    /// Renders each field to text, in declaration order.
    fn to_fields(&self) -> Vec<String>;

    /// Parses a value from a callback string carrying this type's identifier.
    fn parse_from_string(raw: &str) -> DecodeResult<Self> {
        let fields =
            callback_fields(raw, Self::CALLBACK_ID).ok_or_else(|| DecodeError::IdMismatch {
                expected: Self::CALLBACK_ID,
                data: raw.to_string(),
            })?;
        Self::from_fields(&fields)
    }

    /// Renders the canonical callback string for this value.
    fn to_callback_string(&self) -> Result<String, EncodeError> {
        let mut out = String::from(Self::CALLBACK_ID);
        for (index, value) in self.to_fields().into_iter().enumerate() {
            if value.contains(CALLBACK_SEP) || value.contains(FIELD_SEP) {
                return Err(EncodeError::ReservedSeparator { index, value });
            }
            out.push(FIELD_SEP);
            out.push_str(&value);
        }
        Ok(out)
    }
}

/// Returns whether `raw` belongs to the structured type identified by `id`.
///
/// Matches the bare identifier, or the identifier immediately followed by
/// [`CALLBACK_SEP`] or [`FIELD_SEP`]. A longer identifier sharing the prefix
/// (`"abcd"` for `"abc"`) does not match.
pub fn matches_callback_id(raw: &str, id: &str) -> bool {
    strip_callback_id(raw, id).is_some()
}

/// Strips `id` and the separator that follows it, returning the remainder.
///
/// Returns `Some("")` for the bare identifier and `None` when `raw` does not
/// belong to `id`.
pub fn strip_callback_id<'a>(raw: &'a str, id: &str) -> Option<&'a str> {
    let rest = raw.strip_prefix(id)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(CALLBACK_SEP)
        .or_else(|| rest.strip_prefix(FIELD_SEP))
}

/// Splits the fields of a structured value identified by `id`.
///
/// The bare identifier has no fields. Once a separator follows the
/// identifier there is at least one field, so `"note¶"` yields one empty
/// field. Returns `None` when `raw` does not belong to `id`.
pub fn callback_fields<'a>(raw: &'a str, id: &str) -> Option<Vec<&'a str>> {
    let rest = strip_callback_id(raw, id)?;
    if raw.len() == id.len() {
        Some(Vec::new())
    } else {
        Some(rest.split(FIELD_SEP).collect())
    }
}

/// Joins positional segments with [`CALLBACK_SEP`].
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            out.push(CALLBACK_SEP);
        }
        out.push_str(segment.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Page {
        number: u32,
    }

    impl CallbackData for Page {
        const CALLBACK_ID: &'static str = "page";

        fn from_fields(fields: &[&str]) -> DecodeResult<Self> {
            let [number] = fields else {
                return Err(DecodeError::FieldCount {
                    expected: 1,
                    actual: fields.len(),
                });
            };
            let number = number
                .parse()
                .map_err(|e| DecodeError::invalid_field("number", *number, e))?;
            Ok(Self { number })
        }

        fn to_fields(&self) -> Vec<String> {
            vec![self.number.to_string()]
        }
    }

    #[test]
    fn test_matches_callback_id() {
        assert!(matches_callback_id("abc", "abc"));
        assert!(matches_callback_id("abc~42", "abc"));
        assert!(matches_callback_id("abc¶42", "abc"));
        assert!(!matches_callback_id("xyz~42", "abc"));
        assert!(!matches_callback_id("abcd~42", "abc"));
        assert!(!matches_callback_id("ab", "abc"));
    }

    #[test]
    fn test_strip_callback_id() {
        assert_eq!(strip_callback_id("abc", "abc"), Some(""));
        assert_eq!(strip_callback_id("abc~4~2", "abc"), Some("4~2"));
        assert_eq!(strip_callback_id("abc¶4", "abc"), Some("4"));
        assert_eq!(strip_callback_id("abcd", "abc"), None);
    }

    #[test]
    fn test_callback_fields() {
        assert_eq!(callback_fields("note", "note"), Some(vec![]));
        assert_eq!(callback_fields("note¶", "note"), Some(vec![""]));
        assert_eq!(callback_fields("note~", "note"), Some(vec![""]));
        assert_eq!(callback_fields("note¶a¶b", "note"), Some(vec!["a", "b"]));
        assert_eq!(callback_fields("note¶¶", "note"), Some(vec!["", ""]));
        assert_eq!(callback_fields("notes¶a", "note"), None);
    }

    #[test]
    fn test_join_segments() {
        assert_eq!(join_segments(["a", "b", "c"]), "a~b~c");
        assert_eq!(join_segments(Vec::<String>::new()), "");
    }

    #[test]
    fn test_structured_round_trip() {
        let raw = Page { number: 3 }.to_callback_string().unwrap();
        assert_eq!(raw, "page¶3");
        assert_eq!(Page::parse_from_string(&raw).unwrap(), Page { number: 3 });
        // The positional form is accepted as well.
        assert_eq!(Page::parse_from_string("page~7").unwrap(), Page { number: 7 });
    }

    #[test]
    fn test_parse_rejects_foreign_identifier() {
        let err = Page::parse_from_string("vote¶3").unwrap_err();
        assert!(matches!(err, DecodeError::IdMismatch { expected: "page", .. }));
    }

    #[test]
    fn test_parse_reports_bad_field() {
        let err = Page::parse_from_string("page¶three").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "number", .. }));
    }

    #[test]
    fn test_encode_rejects_reserved_separator() {
        struct Label(String);

        impl CallbackData for Label {
            const CALLBACK_ID: &'static str = "label";

            fn from_fields(fields: &[&str]) -> DecodeResult<Self> {
                Ok(Self(fields.join("")))
            }

            fn to_fields(&self) -> Vec<String> {
                vec![self.0.clone()]
            }
        }

        let err = Label("a~b".into()).to_callback_string().unwrap_err();
        assert_eq!(
            err,
            EncodeError::ReservedSeparator {
                index: 0,
                value: "a~b".into()
            }
        );
    }
}
