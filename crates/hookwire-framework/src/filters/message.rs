//! Filters over message updates. All of them reject other update kinds.

use crate::filter::Filter;

/// Passes text messages.
pub fn text<C: 'static>() -> Filter<C> {
    Filter::message(|_, m| m.text.is_some())
}

/// Passes text messages whose body equals `expected`.
pub fn text_equals<C: 'static>(expected: impl Into<String>) -> Filter<C> {
    let expected = expected.into();
    Filter::message(move |_, m| m.text.as_deref() == Some(expected.as_str()))
}

/// Passes text messages whose body starts with `prefix`.
pub fn text_starts_with<C: 'static>(prefix: impl Into<String>) -> Filter<C> {
    let prefix = prefix.into();
    Filter::message(move |_, m| m.text.as_deref().is_some_and(|t| t.starts_with(&prefix)))
}

/// Passes messages carrying a media attachment.
pub fn media<C: 'static>() -> Filter<C> {
    Filter::message(|_, m| m.has_media())
}

/// Passes messages that reply to another message.
pub fn reply<C: 'static>() -> Filter<C> {
    Filter::message(|_, m| m.is_reply())
}

/// Passes forwarded messages.
pub fn forwarded<C: 'static>() -> Filter<C> {
    Filter::message(|_, m| m.forwarded)
}
