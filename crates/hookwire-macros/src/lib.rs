//! Procedural macros for the hookwire webhook dispatcher.
//!
//! This crate provides:
//!
//! - `#[derive(CallbackData)]` - packs a struct into a button or list-row
//!   payload and parses it back
//!
//! The derive is re-exported by `hookwire-core` (feature `derive`) and by the
//! `hookwire` facade, so it is rarely depended on directly.

mod callback;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `CallbackData` for a struct.
///
/// Every field is rendered with `Display` and parsed back with `FromStr`, in
/// declaration order. Named, tuple and unit structs are supported.
///
/// # Attributes
///
/// - `#[callback(id = "...")]` - Set the callback identifier (default: the struct name)
/// - `#[callback(crate = "...")]` - Path to `hookwire_core` (default: `::hookwire_core`)
///
/// The identifier must be non-empty and must not contain `~` or `¶`.
///
/// # Example
///
/// ```rust,ignore
/// use hookwire_core::CallbackData;
///
/// #[derive(CallbackData)]
/// #[callback(id = "vote")]
/// pub struct Vote {
///     pub poll: u32,
///     pub choice: String,
/// }
///
/// // Through the facade crate:
/// #[derive(hookwire::prelude::CallbackData)]
/// #[callback(crate = "hookwire::core")]
/// pub struct Page(u32);
/// ```
#[proc_macro_derive(CallbackData, attributes(callback))]
pub fn derive_callback_data(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match callback::derive_callback_data(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
