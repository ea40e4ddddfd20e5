//! Update dispatcher.
//!
//! The [`Dispatcher`] owns the handler registry: one ordered bucket per
//! [`HandlerKind`]. Dispatching an update runs every handler of the update's
//! bucket, in registration order, through [`Handler::invoke`].
//!
//! ```text
//! webhook JSON ─┬─▶ RawUpdate bucket            (every payload)
//!               └─▶ Update::from_webhook ──▶ Message / CallbackButton /
//!                                            CallbackSelection / MessageStatus bucket
//! ```
//!
//! ```rust,ignore
//! use hookwire_framework::{Dispatcher, ErrorPolicy, Handler};
//!
//! let dispatcher = Dispatcher::new()
//!     .with(Handler::message(on_message))
//!     .with(Handler::raw_update(audit))
//!     .error_policy(ErrorPolicy::Continue);
//!
//! let report = dispatcher.dispatch_webhook(&bot, &payload)?;
//! ```

use std::collections::HashMap;
use std::fmt;

use hookwire_core::{RawUpdate, Update};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Level, debug, error, span, trace, warn};

use crate::error::DispatchError;
use crate::handler::{Handler, HandlerKind};

/// What the dispatcher does when a handler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop and return the first error.
    #[default]
    Propagate,
    /// Log the error and keep going with the next handler.
    Continue,
}

/// Summary of one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers whose kind matched the update.
    pub considered: usize,
    /// Handlers whose callback ran and succeeded.
    pub executed: usize,
    /// Handlers that failed (only counted under [`ErrorPolicy::Continue`]).
    pub failed: usize,
}

impl DispatchReport {
    /// Whether at least one callback ran successfully.
    pub fn handled(&self) -> bool {
        self.executed > 0
    }

    fn merge(&mut self, other: DispatchReport) {
        self.considered += other.considered;
        self.executed += other.executed;
        self.failed += other.failed;
    }
}

/// The handler registry and dispatch loop.
///
/// Handlers are cheap to clone, so cloning a dispatcher is too.
pub struct Dispatcher<C> {
    handlers: HashMap<HandlerKind, Vec<Handler<C>>>,
    error_policy: ErrorPolicy,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            error_policy: self.error_policy,
        }
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl<C: 'static> Dispatcher<C> {
    /// Creates a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the error policy (builder pattern).
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets the error policy.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.error_policy = policy;
    }

    /// Adds a handler to the bucket of its kind.
    ///
    /// Handlers of one kind run in the order they are added.
    pub fn add(&mut self, handler: Handler<C>) {
        self.handlers.entry(handler.kind()).or_default().push(handler);
    }

    /// Adds a handler (builder pattern).
    pub fn with(mut self, handler: Handler<C>) -> Self {
        self.add(handler);
        self
    }

    /// Returns the handlers registered for `kind`, in order.
    pub fn handlers(&self, kind: HandlerKind) -> &[Handler<C>] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Clears all registered handlers.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Dispatches an update to every handler of its kind.
    ///
    /// Under [`ErrorPolicy::Propagate`] the first failing handler ends the
    /// dispatch and its error is returned as is.
    pub fn dispatch(&self, ctx: &C, update: &Update) -> anyhow::Result<DispatchReport> {
        let kind = update.kind();
        let span = span!(Level::DEBUG, "dispatch", kind = %kind);
        let _enter = span.enter();

        let handlers = self.handlers(kind);
        let mut report = DispatchReport {
            considered: handlers.len(),
            ..DispatchReport::default()
        };

        for handler in handlers {
            let name = handler.name().unwrap_or("unnamed");
            match handler.invoke(ctx, update) {
                Ok(true) => {
                    trace!(handler = name, "Handler executed");
                    report.executed += 1;
                }
                Ok(false) => trace!(handler = name, "Filters rejected update"),
                Err(e) => match self.error_policy {
                    ErrorPolicy::Propagate => return Err(e),
                    ErrorPolicy::Continue => {
                        error!(handler = name, error = %e, "Handler failed, continuing");
                        report.failed += 1;
                    }
                },
            }
        }

        debug!(
            considered = report.considered,
            executed = report.executed,
            failed = report.failed,
            "Dispatch finished"
        );
        Ok(report)
    }

    /// Dispatches a webhook payload.
    ///
    /// Raw handlers see every payload first. The payload is then classified
    /// and, if it yields a typed update, dispatched to that kind's bucket.
    /// A payload that fails classification is an error under
    /// [`ErrorPolicy::Propagate`] and a warning under [`ErrorPolicy::Continue`].
    pub fn dispatch_webhook(&self, ctx: &C, payload: &Value) -> anyhow::Result<DispatchReport> {
        let mut report = DispatchReport::default();

        if !self.handlers(HandlerKind::RawUpdate).is_empty() {
            let raw = Update::Raw(RawUpdate::new(payload.clone()));
            report.merge(self.dispatch(ctx, &raw)?);
        }

        match Update::from_webhook(payload) {
            Ok(Some(update)) => report.merge(self.dispatch(ctx, &update)?),
            Ok(None) => debug!("Payload carries no typed update"),
            Err(e) => match self.error_policy {
                ErrorPolicy::Propagate => return Err(DispatchError::InvalidPayload(e).into()),
                ErrorPolicy::Continue => warn!(error = %e, "Skipping unclassifiable payload"),
            },
        }

        Ok(report)
    }
}

impl<C> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field(
                "handler_count",
                &self.handlers.values().map(Vec::len).sum::<usize>(),
            )
            .field("error_policy", &self.error_policy)
            .finish()
    }
}
