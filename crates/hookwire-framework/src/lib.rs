//! # Hookwire Framework
//!
//! The dispatch core of the hookwire webhook dispatcher.
//!
//! This layer provides:
//! - [`Filter`] predicates and the built-in [`filters`]
//! - Callback-data factory resolution ([`FactorySpec`], [`resolve_factory`])
//! - [`Handler`], one type for all five update kinds, with typed constructors
//! - The [`Dispatcher`] registry and its tower adapter ([`DispatchService`])
//!
//! Dispatch is synchronous and exception transparent: a handler runs its
//! filters left to right, stops at the first rejection, and hands callback
//! errors back unchanged. The dispatcher decides what a failure means through
//! its [`ErrorPolicy`].

pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod filter;
pub mod filters;
pub mod handler;
pub mod service;

#[cfg(test)]
mod test_support;

pub use dispatcher::{DispatchReport, Dispatcher, ErrorPolicy};
pub use error::{DispatchError, FactoryResult, InvalidFactorySpecError, UpdateSkipped};
pub use factory::{
    CallbackValue, DecodeCallback, DecodedValue, FactoryElement, FactorySpec, PlainDecoder,
    ResolveOptions, ResolvedFactory, StructuredFactory, resolve_factory,
};
pub use filter::{Filter, FilterFn};
pub use handler::{Handler, HandlerKind, HandlerOutput};
pub use service::{DispatchService, UpdatePredicate};
