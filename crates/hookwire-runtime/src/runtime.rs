//! The webhook runtime.
//!
//! [`WebhookRuntime`] ties a client context to a shared handler registry and
//! the loaded configuration. The HTTP layer in front of it hands over each
//! webhook body; the runtime decodes it and dispatches it synchronously.
//!
//! ```rust,ignore
//! use hookwire_runtime::{ConfigLoader, WebhookRuntime};
//!
//! let runtime = WebhookRuntime::from_loader(Bot::new(), ConfigLoader::new())?;
//! let _guard = runtime.init_logging();
//!
//! runtime.add_handler(Handler::message(on_message));
//! runtime.handle_bytes(&body)?;
//! ```
//!
//! Registration is copy-on-write: dispatch works on a snapshot of the
//! registry, so handlers may register further handlers without deadlocking,
//! and those take effect from the next update on.

use std::fmt;
use std::sync::Arc;

use hookwire_core::{CallbackButton, CallbackSelection, Update};
use hookwire_framework::{
    DecodedValue, DispatchReport, DispatchService, Dispatcher, FactoryResult, FactorySpec,
    Handler, HandlerKind, HandlerOutput, ResolveOptions,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{ConfigLoader, HookwireConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging::{self, LoggingGuard};

/// A client context, its handler registry and the runtime configuration.
pub struct WebhookRuntime<C> {
    ctx: Arc<C>,
    dispatcher: RwLock<Arc<Dispatcher<C>>>,
    config: HookwireConfig,
}

impl<C: Send + Sync + 'static> WebhookRuntime<C> {
    /// Creates a runtime with the default configuration.
    pub fn new(ctx: C) -> Self {
        Self::build(Arc::new(ctx), HookwireConfig::default())
    }

    /// Creates a runtime from an already loaded configuration.
    pub fn from_config(ctx: C, config: HookwireConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        Ok(Self::build(Arc::new(ctx), config))
    }

    /// Loads the configuration and creates a runtime from it.
    pub fn from_loader(ctx: C, loader: ConfigLoader) -> RuntimeResult<Self> {
        let config = loader.load()?;
        Ok(Self::build(Arc::new(ctx), config))
    }

    /// Creates a runtime over a context that is already shared.
    pub fn with_shared_context(ctx: Arc<C>, config: HookwireConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        Ok(Self::build(ctx, config))
    }

    fn build(ctx: Arc<C>, config: HookwireConfig) -> Self {
        let dispatcher = Dispatcher::new().error_policy(config.dispatch.error_policy);
        info!(
            error_policy = ?config.dispatch.error_policy,
            strict_positional_filters = config.dispatch.strict_positional_filters,
            "Webhook runtime created"
        );
        Self {
            ctx,
            dispatcher: RwLock::new(Arc::new(dispatcher)),
            config,
        }
    }

    pub fn config(&self) -> &HookwireConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }

    /// Factory resolution options for handlers built for this runtime.
    ///
    /// [`callback_button_handler`](Self::callback_button_handler) and
    /// [`callback_selection_handler`](Self::callback_selection_handler)
    /// apply them already. Handlers built with `Handler::callback_button`
    /// directly use the defaults unless these are passed to the `_with`
    /// constructors.
    pub fn resolve_options(&self) -> ResolveOptions {
        self.config.dispatch.resolve_options()
    }

    /// Builds a button handler with the configured resolve options.
    ///
    /// The handler is not registered; add filters and pass it to
    /// [`add_handler`](Self::add_handler).
    pub fn callback_button_handler<F, R>(
        &self,
        callback: F,
        factory: FactorySpec<C>,
    ) -> FactoryResult<Handler<C>>
    where
        F: Fn(&C, &CallbackButton, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Handler::callback_button_with(callback, factory, self.resolve_options())
    }

    /// Builds a list selection handler with the configured resolve options.
    pub fn callback_selection_handler<F, R>(
        &self,
        callback: F,
        factory: FactorySpec<C>,
    ) -> FactoryResult<Handler<C>>
    where
        F: Fn(&C, &CallbackSelection, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Handler::callback_selection_with(callback, factory, self.resolve_options())
    }

    /// Installs the global tracing subscriber described by the logging config.
    pub fn init_logging(&self) -> LoggingGuard {
        logging::init_from_config(&self.config.logging)
    }

    /// Registers a handler after those of the same kind.
    pub fn add_handler(&self, handler: Handler<C>) {
        let mut dispatcher = self.dispatcher.write();
        debug!(
            kind = %handler.kind(),
            handler = handler.name().unwrap_or("unnamed"),
            "Registering handler"
        );
        Arc::make_mut(&mut *dispatcher).add(handler);
    }

    /// Registers several handlers, keeping their order.
    pub fn add_handlers(&self, handlers: impl IntoIterator<Item = Handler<C>>) {
        let mut guard = self.dispatcher.write();
        let dispatcher = Arc::make_mut(&mut *guard);
        for handler in handlers {
            dispatcher.add(handler);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.read().handler_count()
    }

    /// Number of handlers registered for one kind.
    pub fn handler_count_for(&self, kind: HandlerKind) -> usize {
        self.dispatcher.read().handlers(kind).len()
    }

    /// Removes every registered handler.
    pub fn clear_handlers(&self) {
        Arc::make_mut(&mut *self.dispatcher.write()).clear();
    }

    /// The registry as it is now.
    pub fn dispatcher(&self) -> Arc<Dispatcher<C>> {
        Arc::clone(&*self.dispatcher.read())
    }

    /// Dispatches one typed update.
    pub fn handle_update(&self, update: &Update) -> anyhow::Result<DispatchReport> {
        self.dispatcher().dispatch(&self.ctx, update)
    }

    /// Dispatches a decoded webhook payload: raw handlers first, then the
    /// typed update it classifies as.
    pub fn handle_payload(&self, payload: &Value) -> anyhow::Result<DispatchReport> {
        self.dispatcher().dispatch_webhook(&self.ctx, payload)
    }

    /// Decodes a webhook body as JSON and dispatches it.
    ///
    /// A body that is not JSON fails with [`RuntimeError::InvalidJson`]
    /// before any handler runs.
    pub fn handle_bytes(&self, body: &[u8]) -> anyhow::Result<DispatchReport> {
        let payload: Value = serde_json::from_slice(body).map_err(RuntimeError::from)?;
        self.handle_payload(&payload)
    }

    /// A tower service over the current registry snapshot.
    ///
    /// Handlers added afterwards are not seen by the returned service.
    pub fn service(&self) -> DispatchService<C> {
        DispatchService::new(self.dispatcher(), Arc::clone(&self.ctx))
    }
}

impl<C> fmt::Debug for WebhookRuntime<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookRuntime")
            .field("dispatcher", &*self.dispatcher.read())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
