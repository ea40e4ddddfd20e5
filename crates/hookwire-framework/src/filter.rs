//! Filter predicates.
//!
//! A [`Filter`] is a pure predicate over `(context, update)`. Handlers hold an
//! ordered list of them and run the callback only when every one passes,
//! stopping at the first rejection.
//!
//! ```rust,ignore
//! use hookwire_framework::{Filter, filters};
//!
//! let greeting = filters::message::text_starts_with("hi")
//!     .or(filters::message::text_starts_with("hello"));
//! let not_forwarded = !filters::message::forwarded();
//! ```

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use hookwire_core::{
    CallbackButton, CallbackSelection, Message, MessageStatus, RawUpdate, Update,
};

/// A type-erased filter predicate.
pub type FilterFn<C> = dyn Fn(&C, &Update) -> bool + Send + Sync;

/// A cheap-to-clone predicate over a client context and an update.
///
/// Filters must not mutate the update; they may be evaluated concurrently for
/// independent updates.
pub struct Filter<C> {
    check: Arc<FilterFn<C>>,
}

impl<C> Clone for Filter<C> {
    fn clone(&self) -> Self {
        Self {
            check: Arc::clone(&self.check),
        }
    }
}

impl<C> fmt::Debug for Filter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

impl<C: 'static> Filter<C> {
    /// Wraps a predicate over any update.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&C, &Update) -> bool + Send + Sync + 'static,
    {
        Self { check: Arc::new(f) }
    }

    /// Evaluates the filter.
    pub fn check(&self, ctx: &C, update: &Update) -> bool {
        (self.check)(ctx, update)
    }

    /// Passes when both filters pass. `other` is skipped when `self` rejects.
    pub fn and(self, other: Filter<C>) -> Self {
        Self::new(move |ctx, update| self.check(ctx, update) && other.check(ctx, update))
    }

    /// Passes when either filter passes. `other` is skipped when `self` passes.
    pub fn or(self, other: Filter<C>) -> Self {
        Self::new(move |ctx, update| self.check(ctx, update) || other.check(ctx, update))
    }

    /// Predicate over message updates. Other kinds are rejected.
    pub fn message<F>(f: F) -> Self
    where
        F: Fn(&C, &Message) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, update| update.as_message().is_some_and(|m| f(ctx, m)))
    }

    /// Predicate over button clicks. Other kinds are rejected.
    pub fn button<F>(f: F) -> Self
    where
        F: Fn(&C, &CallbackButton) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, update| update.as_callback_button().is_some_and(|b| f(ctx, b)))
    }

    /// Predicate over list selections. Other kinds are rejected.
    pub fn selection<F>(f: F) -> Self
    where
        F: Fn(&C, &CallbackSelection) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, update| {
            update
                .as_callback_selection()
                .is_some_and(|s| f(ctx, s))
        })
    }

    /// Predicate over status updates. Other kinds are rejected.
    pub fn status<F>(f: F) -> Self
    where
        F: Fn(&C, &MessageStatus) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, update| update.as_message_status().is_some_and(|s| f(ctx, s)))
    }

    /// Predicate over raw payloads. Other kinds are rejected.
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&C, &RawUpdate) -> bool + Send + Sync + 'static,
    {
        Self::new(move |ctx, update| update.as_raw().is_some_and(|r| f(ctx, r)))
    }

    /// Predicate over the raw callback string of button and selection updates.
    pub fn callback_data<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::new(move |_, update| update.callback_data().is_some_and(&f))
    }
}

impl<C: 'static> Not for Filter<C> {
    type Output = Filter<C>;

    fn not(self) -> Self::Output {
        Filter::new(move |ctx, update| !self.check(ctx, update))
    }
}
