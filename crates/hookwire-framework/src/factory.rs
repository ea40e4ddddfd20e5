//! Callback-data factory resolution.
//!
//! Button and selection handlers take a [`FactorySpec`] describing how their
//! raw callback string turns into typed values. Resolving it once, at
//! construction, yields a [`ResolvedFactory`]: a decoder plus an optional
//! derived filter that pre-screens updates by structured identifier.
//!
//! | Spec | Decoder | Derived filter |
//! |------|---------|----------------|
//! | `Structured(T)` | `T::parse_from_string` | identifier of `T` |
//! | `Plain(f)` | `f` | none |
//! | `Sequence([..])` | split on `~`, decode positionally | first structured identifier |
//!
//! With [`ResolveOptions::strict_positional_filters`] the sequence filter
//! checks every structured position and the segment count instead.

use std::any::{Any, type_name};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hookwire_core::{
    CALLBACK_SEP, CallbackButton, CallbackData, CallbackSelection, DecodeError, DecodeResult,
    FIELD_SEP, matches_callback_id,
};

use crate::error::{FactoryResult, InvalidFactorySpecError};
use crate::filter::Filter;
use crate::filters;

// ============================================================================
// Decoded values
// ============================================================================

/// A decoded callback value of any type.
pub type CallbackValue = Arc<dyn Any + Send + Sync>;

/// Output of a resolved decoder.
#[derive(Clone)]
pub enum DecodedValue {
    /// Produced by a structured or plain factory.
    Single(CallbackValue),
    /// Produced by a positional sequence, one value per segment.
    Sequence(Vec<CallbackValue>),
}

impl DecodedValue {
    /// Downcasts a single value.
    pub fn single<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Single(value) => value.downcast_ref(),
            Self::Sequence(_) => None,
        }
    }

    /// Downcasts the value at `index`. A single value sits at index 0.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)?.downcast_ref()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// All values in positional order.
    pub fn as_slice(&self) -> &[CallbackValue] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Sequence(values) => values,
        }
    }

    pub fn into_values(self) -> Vec<CallbackValue> {
        match self {
            Self::Single(value) => vec![value],
            Self::Sequence(values) => values,
        }
    }
}

impl fmt::Debug for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("DecodedValue::Single(..)"),
            Self::Sequence(values) => write!(f, "DecodedValue::Sequence(len = {})", values.len()),
        }
    }
}

// ============================================================================
// Factory building blocks
// ============================================================================

type ParseFn = fn(&str) -> DecodeResult<CallbackValue>;

fn parse_erased<T: CallbackData>(raw: &str) -> DecodeResult<CallbackValue> {
    let value: CallbackValue = Arc::new(T::parse_from_string(raw)?);
    Ok(value)
}

/// A structured-data type, captured as its identifier and self-decoder.
#[derive(Clone, Copy)]
pub struct StructuredFactory {
    callback_id: &'static str,
    type_name: &'static str,
    parse: ParseFn,
}

impl StructuredFactory {
    /// Captures `T`.
    pub fn of<T: CallbackData>() -> Self {
        Self {
            callback_id: T::CALLBACK_ID,
            type_name: type_name::<T>(),
            parse: parse_erased::<T>,
        }
    }

    /// The type's callback identifier.
    pub fn callback_id(&self) -> &'static str {
        self.callback_id
    }

    /// The Rust type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Parses a value of the captured type.
    pub fn parse(&self, raw: &str) -> DecodeResult<CallbackValue> {
        (self.parse)(raw)
    }

    fn validate(&self) -> FactoryResult<()> {
        if self.callback_id.is_empty() {
            return Err(InvalidFactorySpecError::EmptyCallbackId {
                type_name: self.type_name,
            });
        }
        if self.callback_id.contains([CALLBACK_SEP, FIELD_SEP]) {
            return Err(InvalidFactorySpecError::ReservedSeparator {
                type_name: self.type_name,
                callback_id: self.callback_id,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for StructuredFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredFactory")
            .field("callback_id", &self.callback_id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

type DecodeFn<C> = dyn Fn(&C, &str) -> DecodeResult<CallbackValue> + Send + Sync;

/// A plain decoding function `(context, raw) -> value`.
pub struct PlainDecoder<C> {
    decode: Arc<DecodeFn<C>>,
}

impl<C> Clone for PlainDecoder<C> {
    fn clone(&self) -> Self {
        Self {
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<C: 'static> PlainDecoder<C> {
    /// Wraps a decoding function.
    pub fn new<F, T>(f: F) -> Self
    where
        F: Fn(&C, &str) -> DecodeResult<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self {
            decode: Arc::new(move |ctx: &C, raw: &str| {
                let value: CallbackValue = Arc::new(f(ctx, raw)?);
                Ok(value)
            }),
        }
    }

    /// Yields the raw string unchanged, as a `String`.
    pub fn identity() -> Self {
        Self::new(|_, raw| Ok(raw.to_string()))
    }

    /// Parses the raw string with `T`'s `FromStr`.
    pub fn parse<T>() -> Self
    where
        T: FromStr + Any + Send + Sync,
        T::Err: fmt::Display,
    {
        Self::new(|_, raw| {
            raw.parse::<T>().map_err(|e| {
                DecodeError::custom(format!("cannot parse '{raw}' as {}: {e}", type_name::<T>()))
            })
        })
    }

    /// Runs the decoder.
    pub fn decode(&self, ctx: &C, raw: &str) -> DecodeResult<CallbackValue> {
        (self.decode)(ctx, raw)
    }
}

impl<C> fmt::Debug for PlainDecoder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainDecoder").finish_non_exhaustive()
    }
}

/// One position of a [`FactorySpec::Sequence`].
pub enum FactoryElement<C> {
    Structured(StructuredFactory),
    Plain(PlainDecoder<C>),
}

impl<C> Clone for FactoryElement<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Structured(s) => Self::Structured(*s),
            Self::Plain(p) => Self::Plain(p.clone()),
        }
    }
}

impl<C> fmt::Debug for FactoryElement<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(s) => f.debug_tuple("Structured").field(s).finish(),
            Self::Plain(p) => f.debug_tuple("Plain").field(p).finish(),
        }
    }
}

impl<C: 'static> FactoryElement<C> {
    /// A structured position.
    pub fn structured<T: CallbackData>() -> Self {
        Self::Structured(StructuredFactory::of::<T>())
    }

    /// A plain position.
    pub fn plain<F, T>(f: F) -> Self
    where
        F: Fn(&C, &str) -> DecodeResult<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self::Plain(PlainDecoder::new(f))
    }

    fn decode(&self, ctx: &C, raw: &str) -> DecodeResult<CallbackValue> {
        match self {
            Self::Structured(s) => s.parse(raw),
            Self::Plain(p) => p.decode(ctx, raw),
        }
    }

    fn as_structured(&self) -> Option<&StructuredFactory> {
        match self {
            Self::Structured(s) => Some(s),
            Self::Plain(_) => None,
        }
    }
}

impl<C> From<StructuredFactory> for FactoryElement<C> {
    fn from(s: StructuredFactory) -> Self {
        Self::Structured(s)
    }
}

impl<C> From<PlainDecoder<C>> for FactoryElement<C> {
    fn from(p: PlainDecoder<C>) -> Self {
        Self::Plain(p)
    }
}

// ============================================================================
// Factory spec
// ============================================================================

/// How a callback handler decodes its raw callback string.
pub enum FactorySpec<C> {
    /// A single structured-data type.
    Structured(StructuredFactory),
    /// A single plain decoding function.
    Plain(PlainDecoder<C>),
    /// Positional decoders over `~`-joined segments.
    Sequence(Vec<FactoryElement<C>>),
}

impl<C: 'static> FactorySpec<C> {
    /// A single structured type `T`.
    pub fn structured<T: CallbackData>() -> Self {
        Self::Structured(StructuredFactory::of::<T>())
    }

    /// A single plain decoder.
    pub fn plain<F, T>(f: F) -> Self
    where
        F: Fn(&C, &str) -> DecodeResult<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Self::Plain(PlainDecoder::new(f))
    }

    /// The default factory: the raw string as a `String`.
    pub fn identity() -> Self {
        Self::Plain(PlainDecoder::identity())
    }

    /// A positional sequence.
    pub fn sequence<I>(elements: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FactoryElement<C>>,
    {
        Self::Sequence(elements.into_iter().map(Into::into).collect())
    }
}

impl<C: 'static> Default for FactorySpec<C> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<C> From<StructuredFactory> for FactorySpec<C> {
    fn from(s: StructuredFactory) -> Self {
        Self::Structured(s)
    }
}

impl<C> From<PlainDecoder<C>> for FactorySpec<C> {
    fn from(p: PlainDecoder<C>) -> Self {
        Self::Plain(p)
    }
}

impl<C> fmt::Debug for FactorySpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(s) => f.debug_tuple("Structured").field(s).finish(),
            Self::Plain(p) => f.debug_tuple("Plain").field(p).finish(),
            Self::Sequence(elements) => f.debug_tuple("Sequence").field(elements).finish(),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Options for [`resolve_factory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Derive a filter that checks every structured position of a sequence
    /// and its segment count, instead of only the first structured identifier.
    ///
    /// Changes which updates reach sequence handlers, so it is off by default.
    pub strict_positional_filters: bool,
}

impl ResolveOptions {
    /// Options with strict positional filters enabled.
    pub fn strict() -> Self {
        Self {
            strict_positional_filters: true,
        }
    }
}

enum Decoder<C> {
    Single(FactoryElement<C>),
    Sequence(Vec<FactoryElement<C>>),
}

impl<C> Clone for Decoder<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Single(e) => Self::Single(e.clone()),
            Self::Sequence(es) => Self::Sequence(es.clone()),
        }
    }
}

/// A decoder plus the filter derived from the factory's structured identifier.
pub struct ResolvedFactory<C> {
    decoder: Decoder<C>,
    derived_filter: Option<Filter<C>>,
}

impl<C> Clone for ResolvedFactory<C> {
    fn clone(&self) -> Self {
        Self {
            decoder: self.decoder.clone(),
            derived_filter: self.derived_filter.clone(),
        }
    }
}

impl<C> fmt::Debug for ResolvedFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions = match &self.decoder {
            Decoder::Single(_) => 1,
            Decoder::Sequence(es) => es.len(),
        };
        f.debug_struct("ResolvedFactory")
            .field("positions", &positions)
            .field("has_derived_filter", &self.derived_filter.is_some())
            .finish()
    }
}

impl<C: 'static> ResolvedFactory<C> {
    /// Decodes a raw callback string.
    ///
    /// Sequences split on `~` and fail with [`DecodeError::SegmentCount`] when
    /// the number of segments differs from the number of positions. A failing
    /// position is reported through [`DecodeError::Segment`].
    pub fn decode(&self, ctx: &C, raw: &str) -> DecodeResult<DecodedValue> {
        match &self.decoder {
            Decoder::Single(element) => element.decode(ctx, raw).map(DecodedValue::Single),
            Decoder::Sequence(elements) => {
                let segments: Vec<&str> = raw.split(CALLBACK_SEP).collect();
                if segments.len() != elements.len() {
                    return Err(DecodeError::SegmentCount {
                        expected: elements.len(),
                        actual: segments.len(),
                    });
                }
                elements
                    .iter()
                    .zip(segments)
                    .enumerate()
                    .map(|(i, (element, segment))| {
                        element.decode(ctx, segment).map_err(|e| e.at_segment(i))
                    })
                    .collect::<DecodeResult<Vec<_>>>()
                    .map(DecodedValue::Sequence)
            }
        }
    }

    /// The derived filter, if the factory names a structured type.
    pub fn derived_filter(&self) -> Option<&Filter<C>> {
        self.derived_filter.as_ref()
    }
}

/// Resolves a factory spec into a decoder and an optional derived filter.
pub fn resolve_factory<C: 'static>(
    spec: FactorySpec<C>,
    options: ResolveOptions,
) -> FactoryResult<ResolvedFactory<C>> {
    match spec {
        FactorySpec::Structured(structured) => {
            structured.validate()?;
            Ok(ResolvedFactory {
                decoder: Decoder::Single(FactoryElement::Structured(structured)),
                derived_filter: Some(filters::callback::data_matches_id(structured.callback_id)),
            })
        }
        FactorySpec::Plain(plain) => Ok(ResolvedFactory {
            decoder: Decoder::Single(FactoryElement::Plain(plain)),
            derived_filter: None,
        }),
        FactorySpec::Sequence(elements) => {
            if elements.is_empty() {
                return Err(InvalidFactorySpecError::EmptySequence);
            }
            for structured in elements.iter().filter_map(FactoryElement::as_structured) {
                structured.validate()?;
            }

            let derived_filter = if options.strict_positional_filters {
                strict_positional_filter(&elements)
            } else {
                elements
                    .iter()
                    .find_map(FactoryElement::as_structured)
                    .map(|s| filters::callback::data_matches_id(s.callback_id))
            };

            Ok(ResolvedFactory {
                decoder: Decoder::Sequence(elements),
                derived_filter,
            })
        }
    }
}

fn strict_positional_filter<C: 'static>(elements: &[FactoryElement<C>]) -> Option<Filter<C>> {
    let ids: Vec<Option<&'static str>> = elements
        .iter()
        .map(|e| e.as_structured().map(StructuredFactory::callback_id))
        .collect();
    if ids.iter().all(Option::is_none) {
        return None;
    }

    Some(Filter::callback_data(move |data| {
        let segments: Vec<&str> = data.split(CALLBACK_SEP).collect();
        segments.len() == ids.len()
            && ids
                .iter()
                .zip(&segments)
                .all(|(id, segment)| id.is_none_or(|id| matches_callback_id(segment, id)))
    }))
}

// ============================================================================
// Callback update helpers
// ============================================================================

/// Decodes the data of a callback update through a resolved factory.
pub trait DecodeCallback {
    /// Decodes this update's raw callback string.
    fn decode<C: 'static>(&self, ctx: &C, factory: &ResolvedFactory<C>)
    -> DecodeResult<DecodedValue>;
}

impl DecodeCallback for CallbackButton {
    fn decode<C: 'static>(
        &self,
        ctx: &C,
        factory: &ResolvedFactory<C>,
    ) -> DecodeResult<DecodedValue> {
        factory.decode(ctx, &self.data)
    }
}

impl DecodeCallback for CallbackSelection {
    fn decode<C: 'static>(
        &self,
        ctx: &C,
        factory: &ResolvedFactory<C>,
    ) -> DecodeResult<DecodedValue> {
        factory.decode(ctx, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{button, message};

    #[derive(Debug, PartialEq)]
    struct Item {
        id: u32,
    }

    impl CallbackData for Item {
        const CALLBACK_ID: &'static str = "id";

        fn from_fields(fields: &[&str]) -> DecodeResult<Self> {
            let [id] = fields else {
                return Err(DecodeError::FieldCount {
                    expected: 1,
                    actual: fields.len(),
                });
            };
            let id = id
                .parse()
                .map_err(|e| DecodeError::invalid_field("id", *id, e))?;
            Ok(Self { id })
        }

        fn to_fields(&self) -> Vec<String> {
            vec![self.id.to_string()]
        }
    }

    #[derive(Debug, PartialEq)]
    struct Abc;

    impl CallbackData for Abc {
        const CALLBACK_ID: &'static str = "abc";

        fn from_fields(_: &[&str]) -> DecodeResult<Self> {
            Ok(Self)
        }

        fn to_fields(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct Broken;

    impl CallbackData for Broken {
        const CALLBACK_ID: &'static str = "a~b";

        fn from_fields(_: &[&str]) -> DecodeResult<Self> {
            Ok(Self)
        }

        fn to_fields(&self) -> Vec<String> {
            Vec::new()
        }
    }

    struct Nameless;

    impl CallbackData for Nameless {
        const CALLBACK_ID: &'static str = "";

        fn from_fields(_: &[&str]) -> DecodeResult<Self> {
            Ok(Self)
        }

        fn to_fields(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn resolve(spec: FactorySpec<()>) -> ResolvedFactory<()> {
        resolve_factory(spec, ResolveOptions::default()).unwrap()
    }

    #[test]
    fn test_structured_factory_derives_prefix_filter() {
        let resolved = resolve(FactorySpec::structured::<Abc>());
        let filter = resolved.derived_filter().unwrap();
        assert!(filter.check(&(), &button("abc~42")));
        assert!(!filter.check(&(), &button("xyz~42")));
    }

    #[test]
    fn test_structured_factory_decodes_with_type() {
        let resolved = resolve(FactorySpec::structured::<Item>());
        let value = resolved.decode(&(), "id¶7").unwrap();
        assert_eq!(value.single::<Item>(), Some(&Item { id: 7 }));
    }

    #[test]
    fn test_plain_factory_has_no_filter() {
        let resolved = resolve(FactorySpec::identity());
        assert!(resolved.derived_filter().is_none());
        let value = resolved.decode(&(), "anything~at¶all").unwrap();
        assert_eq!(value.single::<String>().map(String::as_str), Some("anything~at¶all"));
    }

    #[test]
    fn test_plain_factory_receives_context() {
        let resolved = resolve_factory(
            FactorySpec::plain(|ctx: &u32, raw: &str| Ok(format!("{ctx}:{raw}"))),
            ResolveOptions::default(),
        )
        .unwrap();
        let value = resolved.decode(&5, "x").unwrap();
        assert_eq!(value.single::<String>().map(String::as_str), Some("5:x"));
    }

    #[test]
    fn test_sequence_filter_uses_first_structured_element() {
        // A plain element ahead of the structured one does not take the filter.
        let resolved = resolve(FactorySpec::sequence([
            FactoryElement::plain(|_, raw: &str| Ok(raw.len())),
            FactoryElement::structured::<Item>(),
            FactoryElement::structured::<Abc>(),
        ]));
        let filter = resolved.derived_filter().unwrap();
        assert!(filter.check(&(), &button("id~whatever")));
        assert!(!filter.check(&(), &button("abc~whatever")));
    }

    #[test]
    fn test_sequence_filter_ignores_plain_decoder_behavior() {
        let resolved = resolve(FactorySpec::sequence([
            FactoryElement::structured::<Item>(),
            FactoryElement::plain(|_, _: &str| -> DecodeResult<()> {
                Err(DecodeError::custom("always fails"))
            }),
        ]));
        let derived = resolved.derived_filter().unwrap();
        let reference = filters::callback::data_matches_id::<()>("id");
        for data in ["id", "id¶1~x", "id~x", "idx~1", "x~id", ""] {
            let update = button(data);
            assert_eq!(derived.check(&(), &update), reference.check(&(), &update), "{data}");
        }
    }

    #[test]
    fn test_sequence_decodes_positionally() {
        let resolved = resolve(FactorySpec::sequence([
            FactoryElement::structured::<Item>(),
            FactoryElement::plain(|_, raw: &str| Ok(raw.to_uppercase())),
            PlainDecoder::parse::<i64>().into(),
        ]));
        let raw = hookwire_core::join_segments(["id¶3", "menu", "-9"]);

        let value = resolved.decode(&(), &raw).unwrap();
        assert_eq!(value.len(), 3);
        assert_eq!(value.get::<Item>(0), Some(&Item { id: 3 }));
        assert_eq!(value.get::<String>(1).map(String::as_str), Some("MENU"));
        assert_eq!(value.get::<i64>(2), Some(&-9));
        assert!(value.single::<Item>().is_none());
    }

    #[test]
    fn test_sequence_segment_count_mismatch() {
        let resolved = resolve(FactorySpec::sequence([
            PlainDecoder::identity(),
            PlainDecoder::identity(),
        ]));
        let err = resolved.decode(&(), "only-one").unwrap_err();
        assert_eq!(
            err,
            DecodeError::SegmentCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_sequence_reports_failing_segment() {
        let resolved = resolve(FactorySpec::sequence([
            FactoryElement::structured::<Abc>(),
            PlainDecoder::parse::<u8>().into(),
        ]));
        let err = resolved.decode(&(), "abc~300").unwrap_err();
        assert!(matches!(err, DecodeError::Segment { index: 1, .. }));
    }

    #[test]
    fn test_invalid_specs() {
        let empty = resolve_factory(FactorySpec::<()>::Sequence(Vec::new()), ResolveOptions::default());
        assert_eq!(empty.unwrap_err(), InvalidFactorySpecError::EmptySequence);

        let broken = resolve_factory(FactorySpec::<()>::structured::<Broken>(), ResolveOptions::default());
        assert!(matches!(
            broken.unwrap_err(),
            InvalidFactorySpecError::ReservedSeparator { callback_id: "a~b", .. }
        ));

        let nameless = resolve_factory(
            FactorySpec::<()>::sequence([FactoryElement::structured::<Nameless>()]),
            ResolveOptions::default(),
        );
        assert!(matches!(
            nameless.unwrap_err(),
            InvalidFactorySpecError::EmptyCallbackId { .. }
        ));
    }

    #[test]
    fn test_strict_positional_filter() {
        let resolved = resolve_factory(
            FactorySpec::<()>::sequence([
                FactoryElement::structured::<Item>(),
                FactoryElement::plain(|_, raw: &str| Ok(raw.to_string())),
                FactoryElement::structured::<Abc>(),
            ]),
            ResolveOptions::strict(),
        )
        .unwrap();
        let filter = resolved.derived_filter().unwrap();
        assert!(filter.check(&(), &button("id¶1~free~abc")));
        assert!(!filter.check(&(), &button("id¶1~free~xyz")));
        assert!(!filter.check(&(), &button("id¶1~free")));
        assert!(!filter.check(&(), &message("id¶1~free~abc")));
    }

    #[test]
    fn test_strict_without_structured_elements_has_no_filter() {
        let resolved = resolve_factory(
            FactorySpec::<()>::sequence([PlainDecoder::identity()]),
            ResolveOptions::strict(),
        )
        .unwrap();
        assert!(resolved.derived_filter().is_none());
    }

    #[test]
    fn test_decode_callback_helper() {
        let resolved = resolve(FactorySpec::structured::<Item>());
        let update = button("id¶11");
        let value = update.as_callback_button().unwrap().decode(&(), &resolved).unwrap();
        assert_eq!(value.single::<Item>(), Some(&Item { id: 11 }));
    }
}
