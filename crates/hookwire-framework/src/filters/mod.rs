//! Built-in filters.
//!
//! | Module | Filters |
//! |--------|---------|
//! | [`message`] | `text`, `text_equals`, `text_starts_with`, `media`, `reply`, `forwarded` |
//! | [`callback`] | `data_equals`, `data_starts_with`, `data_matches_id`, `data_of` |
//! | [`status`] | `sent`, `delivered`, `read`, `failed` |

pub mod callback;
pub mod message;
pub mod status;

use crate::filter::Filter;

/// A filter that passes every update.
pub fn always_true<C: 'static>() -> Filter<C> {
    Filter::new(|_, _| true)
}
