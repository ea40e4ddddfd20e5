//! Filters over the raw callback string of button and selection updates.
//!
//! Both callback kinds are accepted; every other kind is rejected.

use hookwire_core::{CallbackData, matches_callback_id};

use crate::filter::Filter;

/// Passes callbacks whose data equals `expected`.
pub fn data_equals<C: 'static>(expected: impl Into<String>) -> Filter<C> {
    let expected = expected.into();
    Filter::callback_data(move |data| data == expected)
}

/// Passes callbacks whose data starts with `prefix`, with no separator check.
pub fn data_starts_with<C: 'static>(prefix: impl Into<String>) -> Filter<C> {
    let prefix = prefix.into();
    Filter::callback_data(move |data| data.starts_with(&prefix))
}

/// Passes callbacks whose data belongs to the structured identifier `id`.
///
/// See [`matches_callback_id`] for the exact rule.
pub fn data_matches_id<C: 'static>(id: impl Into<String>) -> Filter<C> {
    let id = id.into();
    Filter::callback_data(move |data| matches_callback_id(data, &id))
}

/// Passes callbacks carrying a `T`.
pub fn data_of<C: 'static, T: CallbackData>() -> Filter<C> {
    Filter::callback_data(|data| matches_callback_id(data, T::CALLBACK_ID))
}
