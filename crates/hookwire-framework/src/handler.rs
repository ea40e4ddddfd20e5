//! Handlers.
//!
//! A [`Handler`] binds a user callback and an ordered filter chain to one
//! [`HandlerKind`]. There is a single handler type; the typed constructors
//! ([`Handler::message`], [`Handler::callback_button`], ...) only fix the
//! routing tag and the payload type the callback receives.
//!
//! # Dispatch contract
//!
//! [`Handler::invoke`] evaluates the filters left to right and stops at the
//! first one that rejects the update. When all of them pass (vacuously for an
//! empty chain) the callback runs exactly once. Errors from the callback come
//! back to the caller untouched.
//!
//! Callback handlers decode the callback data with their resolved factory
//! once the filters pass, and hand the [`DecodedValue`] to the callback. A
//! decode failure is returned as the handler's error and the callback does
//! not run.
//!
//! ```rust,ignore
//! use hookwire_framework::{FactorySpec, Handler, filters};
//!
//! let start = Handler::message(|_bot: &Bot, msg| {
//!     println!("{} said {:?}", msg.sender(), msg.text);
//! })
//! .with_filter(filters::message::text_equals("/start"))
//! .named("start");
//!
//! let vote = Handler::callback_button(
//!     |bot: &Bot, click, value| {
//!         if let Some(vote) = value.single::<Vote>() {
//!             bot.tally(vote, &click.meta.from_user.wa_id);
//!         }
//!     },
//!     FactorySpec::structured::<Vote>(),
//! )?;
//! ```

use std::fmt;
use std::sync::Arc;

use hookwire_core::{
    CallbackButton, CallbackSelection, DecodeResult, Message, MessageStatus, RawUpdate, Update,
    UpdateKind,
};
use crate::error::{DispatchError, FactoryResult};
use crate::factory::{DecodedValue, FactorySpec, ResolveOptions, ResolvedFactory, resolve_factory};
use crate::filter::Filter;

/// The routing tag a handler is registered under.
pub type HandlerKind = UpdateKind;

// ============================================================================
// HandlerOutput - Handle callback return values
// ============================================================================

/// Return types accepted from handler callbacks.
pub trait HandlerOutput {
    /// Converts the value into the dispatch result.
    fn into_result(self) -> anyhow::Result<()>;
}

impl HandlerOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Handler
// ============================================================================

type CallbackFn<C> = dyn Fn(&C, &Update) -> anyhow::Result<()> + Send + Sync;

/// Internal data for a Handler.
///
/// Wrapped in an `Arc`; builder methods copy on write.
struct HandlerInner<C> {
    kind: HandlerKind,
    callback: Arc<CallbackFn<C>>,
    filters: Vec<Filter<C>>,
    factory: Option<ResolvedFactory<C>>,
    name: Option<String>,
}

impl<C> Clone for HandlerInner<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            callback: Arc::clone(&self.callback),
            filters: self.filters.clone(),
            factory: self.factory.clone(),
            name: self.name.clone(),
        }
    }
}

/// A callback bound to an update kind and an ordered filter chain.
///
/// Cheap to clone. Immutable once registered with a dispatcher.
pub struct Handler<C> {
    inner: Arc<HandlerInner<C>>,
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: 'static> Handler<C> {
    /// Creates a handler over any update of `kind`.
    ///
    /// The callback receives the update as is.
    pub fn new<F, R>(kind: HandlerKind, callback: F) -> Self
    where
        F: Fn(&C, &Update) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::from_parts(
            kind,
            Arc::new(move |ctx: &C, update: &Update| callback(ctx, update).into_result()),
            None,
        )
    }

    /// Creates a handler for incoming messages.
    pub fn message<F, R>(callback: F) -> Self
    where
        F: Fn(&C, &Message) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::from_parts(
            HandlerKind::Message,
            Arc::new(move |ctx: &C, update: &Update| match update {
                Update::Message(m) => callback(ctx, m).into_result(),
                other => Err(mismatch(HandlerKind::Message, other)),
            }),
            None,
        )
    }

    /// Creates a handler for button clicks.
    ///
    /// The factory is resolved immediately. When it names a structured type
    /// the derived filter becomes the first filter of the chain. The callback
    /// receives the click and its data decoded by the factory.
    pub fn callback_button<F, R>(callback: F, factory: FactorySpec<C>) -> FactoryResult<Self>
    where
        F: Fn(&C, &CallbackButton, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::callback_button_with(callback, factory, ResolveOptions::default())
    }

    /// Like [`Handler::callback_button`], with explicit resolve options.
    pub fn callback_button_with<F, R>(
        callback: F,
        factory: FactorySpec<C>,
        options: ResolveOptions,
    ) -> FactoryResult<Self>
    where
        F: Fn(&C, &CallbackButton, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        let factory = resolve_factory(factory, options)?;
        let decoder = factory.clone();
        Ok(Self::from_parts(
            HandlerKind::CallbackButton,
            Arc::new(move |ctx: &C, update: &Update| match update {
                Update::CallbackButton(b) => {
                    let value = decoder.decode(ctx, &b.data)?;
                    callback(ctx, b, &value).into_result()
                }
                other => Err(mismatch(HandlerKind::CallbackButton, other)),
            }),
            Some(factory),
        ))
    }

    /// Creates a handler for list selections.
    ///
    /// See [`Handler::callback_button`] for how the factory is used.
    pub fn callback_selection<F, R>(callback: F, factory: FactorySpec<C>) -> FactoryResult<Self>
    where
        F: Fn(&C, &CallbackSelection, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::callback_selection_with(callback, factory, ResolveOptions::default())
    }

    /// Like [`Handler::callback_selection`], with explicit resolve options.
    pub fn callback_selection_with<F, R>(
        callback: F,
        factory: FactorySpec<C>,
        options: ResolveOptions,
    ) -> FactoryResult<Self>
    where
        F: Fn(&C, &CallbackSelection, &DecodedValue) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        let factory = resolve_factory(factory, options)?;
        let decoder = factory.clone();
        Ok(Self::from_parts(
            HandlerKind::CallbackSelection,
            Arc::new(move |ctx: &C, update: &Update| match update {
                Update::CallbackSelection(s) => {
                    let value = decoder.decode(ctx, &s.data)?;
                    callback(ctx, s, &value).into_result()
                }
                other => Err(mismatch(HandlerKind::CallbackSelection, other)),
            }),
            Some(factory),
        ))
    }

    /// Creates a handler for delivery status changes.
    pub fn message_status<F, R>(callback: F) -> Self
    where
        F: Fn(&C, &MessageStatus) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::from_parts(
            HandlerKind::MessageStatus,
            Arc::new(move |ctx: &C, update: &Update| match update {
                Update::MessageStatus(s) => callback(ctx, s).into_result(),
                other => Err(mismatch(HandlerKind::MessageStatus, other)),
            }),
            None,
        )
    }

    /// Creates a handler for raw webhook payloads.
    pub fn raw_update<F, R>(callback: F) -> Self
    where
        F: Fn(&C, &RawUpdate) -> R + Send + Sync + 'static,
        R: HandlerOutput,
    {
        Self::from_parts(
            HandlerKind::RawUpdate,
            Arc::new(move |ctx: &C, update: &Update| match update {
                Update::Raw(r) => callback(ctx, r).into_result(),
                other => Err(mismatch(HandlerKind::RawUpdate, other)),
            }),
            None,
        )
    }

    fn from_parts(
        kind: HandlerKind,
        callback: Arc<CallbackFn<C>>,
        factory: Option<ResolvedFactory<C>>,
    ) -> Self {
        let filters = factory
            .as_ref()
            .and_then(ResolvedFactory::derived_filter)
            .cloned()
            .into_iter()
            .collect();
        Self {
            inner: Arc::new(HandlerInner {
                kind,
                callback,
                filters,
                factory,
                name: None,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut HandlerInner<C> {
        Arc::make_mut(&mut self.inner)
    }

    /// Appends a filter to the chain.
    pub fn with_filter(mut self, filter: Filter<C>) -> Self {
        self.inner_mut().filters.push(filter);
        self
    }

    /// Appends a closure filter to the chain.
    pub fn with_filter_fn<F>(self, f: F) -> Self
    where
        F: Fn(&C, &Update) -> bool + Send + Sync + 'static,
    {
        self.with_filter(Filter::new(f))
    }

    /// Appends several filters, keeping their order.
    pub fn with_filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter<C>>,
    {
        self.inner_mut().filters.extend(filters);
        self
    }

    /// Sets a name for this handler (useful for debugging).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.inner_mut().name = Some(name.into());
        self
    }

    /// Returns the routing tag.
    pub fn kind(&self) -> HandlerKind {
        self.inner.kind
    }

    /// Returns the name of this handler, if set.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns the filter chain, derived filter first.
    pub fn filters(&self) -> &[Filter<C>] {
        &self.inner.filters
    }

    /// Returns the resolved factory of a callback handler.
    pub fn factory(&self) -> Option<&ResolvedFactory<C>> {
        self.inner.factory.as_ref()
    }

    /// Decodes a raw callback string with this handler's factory.
    ///
    /// Returns `None` for handlers without a factory.
    pub fn decode(&self, ctx: &C, raw: &str) -> Option<DecodeResult<DecodedValue>> {
        self.factory().map(|f| f.decode(ctx, raw))
    }

    /// Runs the filter chain and, if every filter passes, the callback.
    ///
    /// Returns whether the callback ran. An update of another kind fails
    /// with [`DispatchError::KindMismatch`] before any filter is evaluated.
    pub fn invoke(&self, ctx: &C, update: &Update) -> anyhow::Result<bool> {
        if update.kind() != self.inner.kind {
            return Err(mismatch(self.inner.kind, update));
        }
        if !self.inner.filters.iter().all(|f| f.check(ctx, update)) {
            return Ok(false);
        }
        (self.inner.callback)(ctx, update).map(|()| true)
    }
}

fn mismatch(expected: HandlerKind, update: &Update) -> anyhow::Error {
    DispatchError::KindMismatch {
        expected,
        got: update.kind(),
    }
    .into()
}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("filter_count", &self.inner.filters.len())
            .field("has_factory", &self.inner.factory.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{FactoryElement, PlainDecoder};
    use crate::filters;
    use crate::test_support::{button, message, raw, selection, status};
    use hookwire_core::{CallbackData, DecodeError, MessageStatusType};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Abc(u32);

    impl CallbackData for Abc {
        const CALLBACK_ID: &'static str = "abc";

        fn from_fields(fields: &[&str]) -> DecodeResult<Self> {
            let [n] = fields else {
                return Err(DecodeError::FieldCount {
                    expected: 1,
                    actual: fields.len(),
                });
            };
            n.parse()
                .map(Self)
                .map_err(|e| DecodeError::invalid_field("0", *n, e))
        }

        fn to_fields(&self) -> Vec<String> {
            vec![self.0.to_string()]
        }
    }

    fn counting_filter(counter: &Arc<AtomicUsize>, result: bool) -> Filter<()> {
        let counter = Arc::clone(counter);
        Filter::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler<()> {
        let counter = Arc::clone(counter);
        Handler::message(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_empty_chain_calls_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(&calls);

        assert!(handler.invoke(&(), &message("hi")).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_always_true_calls_callback_with_context_and_update() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let handler = Handler::<u32>::message(move |ctx, msg| {
            assert_eq!(*ctx, 42);
            assert_eq!(msg.text.as_deref(), Some("ping"));
            seen_clone.fetch_add(1, Ordering::SeqCst);
        })
        .with_filter(filters::always_true());

        assert!(handler.invoke(&42, &message("ping")).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_rejection_short_circuits() {
        for k in 0..4 {
            let evaluated: Vec<_> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
            let calls = Arc::new(AtomicUsize::new(0));
            let handler = counting_handler(&calls).with_filters(
                evaluated
                    .iter()
                    .enumerate()
                    .map(|(i, c)| counting_filter(c, i != k)),
            );

            assert!(!handler.invoke(&(), &message("hi")).unwrap());
            assert_eq!(calls.load(Ordering::SeqCst), 0, "callback ran with filter {k} false");
            for (i, c) in evaluated.iter().enumerate() {
                let expected = usize::from(i <= k);
                assert_eq!(c.load(Ordering::SeqCst), expected, "filter {i} with {k} false");
            }
        }
    }

    #[test]
    fn test_filters_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let handler = Handler::<()>::message(|_, _| {}).with_filters((0..3).map(|i| {
            let order = Arc::clone(&order);
            Filter::new(move |_, _| {
                order.lock().unwrap().push(i);
                true
            })
        }));

        handler.invoke(&(), &message("hi")).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_callback_error_propagates_unchanged() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let handler = Handler::<()>::message(|_, _| Err::<(), _>(Boom));
        let err = handler.invoke(&(), &message("hi")).unwrap_err();
        assert!(err.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn test_kind_mismatch_skips_filters() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let handler = Handler::<()>::message_status(|_, _| {})
            .with_filter(counting_filter(&evaluated, true));

        let err = handler.invoke(&(), &message("hi")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DispatchError>(),
            Some(DispatchError::KindMismatch {
                expected: HandlerKind::MessageStatus,
                got: HandlerKind::Message,
            })
        ));
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_identity_factory_adds_no_filter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = Handler::<()>::callback_button(
            move |_, _, value| {
                assert_eq!(value.single::<String>().map(String::as_str), Some("anything"));
                counter.fetch_add(1, Ordering::SeqCst);
            },
            FactorySpec::default(),
        )
        .unwrap();

        assert!(handler.filters().is_empty());
        assert!(handler.invoke(&(), &button("anything")).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_derived_filter_runs_before_user_filters() {
        let user_filter = Arc::new(AtomicUsize::new(0));
        let handler = Handler::<()>::callback_selection(|_, _, _| {}, FactorySpec::structured::<Abc>())
            .unwrap()
            .with_filter(counting_filter(&user_filter, true));

        assert_eq!(handler.filters().len(), 2);
        assert!(!handler.invoke(&(), &selection("xyz~42")).unwrap());
        assert_eq!(user_filter.load(Ordering::SeqCst), 0);

        assert!(handler.invoke(&(), &selection("abc¶42")).unwrap());
        assert_eq!(user_filter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_factory_fails_construction() {
        let result = Handler::<()>::callback_button(|_, _, _| {}, FactorySpec::Sequence(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_handler_decode() {
        let handler = Handler::<()>::callback_button(
            |_, _, _| {},
            FactorySpec::sequence([
                FactoryElement::structured::<Abc>(),
                PlainDecoder::parse::<u8>().into(),
            ]),
        )
        .unwrap();

        let value = handler.decode(&(), "abc¶5~6").unwrap().unwrap();
        assert_eq!(value.get::<Abc>(0), Some(&Abc(5)));
        assert_eq!(value.get::<u8>(1), Some(&6));

        assert!(Handler::<()>::message(|_, _| {}).decode(&(), "abc").is_none());
    }

    #[test]
    fn test_callback_receives_decoded_value() {
        let decodes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&decodes);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = Handler::<()>::callback_selection(
            move |_, selection, value| {
                let abc = value.get::<Abc>(0).map(|a| a.0);
                let tail = value.get::<u32>(1).copied();
                sink.lock().unwrap().push((selection.data.clone(), abc, tail));
            },
            FactorySpec::sequence([
                FactoryElement::structured::<Abc>(),
                FactoryElement::plain(move |_: &(), raw: &str| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    raw.parse::<u32>()
                        .map_err(|e| DecodeError::custom(e.to_string()))
                }),
            ]),
        )
        .unwrap();

        assert!(!handler.invoke(&(), &selection("xyz¶1~2")).unwrap());
        assert_eq!(decodes.load(Ordering::SeqCst), 0);

        assert!(handler.invoke(&(), &selection("abc¶7~9")).unwrap());
        assert_eq!(decodes.load(Ordering::SeqCst), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("abc¶7~9".to_string(), Some(7), Some(9))]
        );
    }

    #[test]
    fn test_decode_error_skips_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = Handler::<()>::callback_button(
            move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            FactorySpec::structured::<Abc>(),
        )
        .unwrap();

        let err = handler.invoke(&(), &button("abc¶seven")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DecodeError>(),
            Some(DecodeError::InvalidField { field: "0", .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_typed_constructors_set_kind() {
        assert_eq!(Handler::<()>::message(|_, _| {}).kind(), HandlerKind::Message);
        assert_eq!(
            Handler::<()>::message_status(|_, _| {}).kind(),
            HandlerKind::MessageStatus
        );
        assert_eq!(Handler::<()>::raw_update(|_, _| {}).kind(), HandlerKind::RawUpdate);
        assert!(
            Handler::<()>::raw_update(|_, _| {})
                .invoke(&(), &raw())
                .unwrap()
        );
        assert!(
            Handler::<()>::message_status(|_, _| {})
                .invoke(&(), &status(MessageStatusType::Sent))
                .unwrap()
        );
    }

    #[test]
    fn test_base_handler_receives_update() {
        let handler = Handler::<()>::new(HandlerKind::CallbackButton, |_, update| {
            assert_eq!(update.callback_data(), Some("x"));
        });
        assert!(handler.invoke(&(), &button("x")).unwrap());
    }

    #[test]
    fn test_builder_copies_on_write() {
        let base = Handler::<()>::message(|_, _| {}).named("base");
        let extended = base.clone().with_filter(filters::always_true());
        assert_eq!(base.filters().len(), 0);
        assert_eq!(extended.filters().len(), 1);
        assert_eq!(extended.name(), Some("base"));
    }
}
