//! Filters over message status updates.

use hookwire_core::MessageStatusType;

use crate::filter::Filter;

fn status_is<C: 'static>(expected: MessageStatusType) -> Filter<C> {
    Filter::status(move |_, s| s.status == expected)
}

/// Passes `sent` statuses.
pub fn sent<C: 'static>() -> Filter<C> {
    status_is(MessageStatusType::Sent)
}

/// Passes `delivered` statuses.
pub fn delivered<C: 'static>() -> Filter<C> {
    status_is(MessageStatusType::Delivered)
}

/// Passes `read` statuses.
pub fn read<C: 'static>() -> Filter<C> {
    status_is(MessageStatusType::Read)
}

/// Passes `failed` statuses.
pub fn failed<C: 'static>() -> Filter<C> {
    status_is(MessageStatusType::Failed)
}
