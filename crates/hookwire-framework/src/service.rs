//! Tower integration.
//!
//! [`DispatchService`] exposes a dispatcher as `tower::Service<Update>` (and
//! `Service<Value>` for raw webhook bodies), so timeouts, concurrency limits
//! and other middleware can wrap dispatch. [`UpdatePredicate`] turns a
//! [`Filter`] into a `tower::filter::Predicate` that rejects with
//! [`UpdateSkipped`].
//!
//! ```rust,ignore
//! use tower::{ServiceBuilder, ServiceExt};
//!
//! let service = ServiceBuilder::new()
//!     .filter(UpdatePredicate::new(filters::callback::data_starts_with("menu"), bot.clone()))
//!     .service(DispatchService::new(Arc::new(dispatcher), bot));
//!
//! let report = service.oneshot(update).await?;
//! ```

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{Ready, ready};
use hookwire_core::Update;
use serde_json::Value;
use tower::filter::Predicate;
use tower::{BoxError, Service};

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::error::UpdateSkipped;
use crate::filter::Filter;

/// A dispatcher and a client context, served as a tower service.
///
/// Dispatch is synchronous, so the returned future is always ready.
pub struct DispatchService<C> {
    dispatcher: Arc<Dispatcher<C>>,
    ctx: Arc<C>,
}

impl<C> Clone for DispatchService<C> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<C: 'static> DispatchService<C> {
    /// Creates a service over a shared dispatcher.
    pub fn new(dispatcher: Arc<Dispatcher<C>>, ctx: Arc<C>) -> Self {
        Self { dispatcher, ctx }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }
}

impl<C: 'static> Service<Update> for DispatchService<C> {
    type Response = DispatchReport;
    type Error = BoxError;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, update: Update) -> Self::Future {
        ready(self.dispatcher.dispatch(&self.ctx, &update).map_err(Into::into))
    }
}

impl<C: 'static> Service<Value> for DispatchService<C> {
    type Response = DispatchReport;
    type Error = BoxError;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Value) -> Self::Future {
        ready(
            self.dispatcher
                .dispatch_webhook(&self.ctx, &payload)
                .map_err(Into::into),
        )
    }
}

// ============================================================================
// UpdatePredicate
// ============================================================================

/// A [`Filter`] bound to a context, usable with `tower::filter::FilterLayer`.
///
/// When the filter rejects, the request fails with [`UpdateSkipped`].
pub struct UpdatePredicate<C> {
    filter: Filter<C>,
    ctx: Arc<C>,
}

impl<C> Clone for UpdatePredicate<C> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<C: 'static> UpdatePredicate<C> {
    pub fn new(filter: Filter<C>, ctx: Arc<C>) -> Self {
        Self { filter, ctx }
    }
}

impl<C: 'static> Predicate<Update> for UpdatePredicate<C> {
    type Request = Update;

    fn check(&mut self, update: Update) -> Result<Self::Request, BoxError> {
        if self.filter.check(&self.ctx, &update) {
            Ok(update)
        } else {
            Err(UpdateSkipped.into())
        }
    }
}
