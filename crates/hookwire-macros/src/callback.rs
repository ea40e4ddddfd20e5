//! `#[derive(CallbackData)]` implementation.
//!
//! # Struct-level attributes `#[callback(...)]`
//!
//! | Key | Example | Required | Description |
//! |-----|---------|----------|-------------|
//! | `id` | `"vote"` | No | Callback identifier (default: struct name) |
//! | `crate` | `"hookwire::core"` | No | Path the generated code uses for `hookwire_core` |
//!
//! # Generated code
//!
//! ```text
//! impl CallbackData for Vote {
//!     const CALLBACK_ID = "vote";
//!     fn from_fields(fields)  // checks the count, then FromStr per field
//!     fn to_fields(&self)     // Display per field
//! }
//! ```

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Path, spanned::Spanned};

const RESERVED: [char; 2] = ['~', '¶'];

// ============================================================================
// Attribute structures
// ============================================================================

struct CallbackAttrs {
    id: String,
    id_span: Span,
    krate: Path,
}

// ============================================================================
// Entry point
// ============================================================================

pub fn derive_callback_data(input: &DeriveInput) -> syn::Result<TokenStream> {
    let attrs = parse_struct_attrs(&input.attrs, &input.ident)?;

    if attrs.id.is_empty() {
        return Err(syn::Error::new(attrs.id_span, "callback id must not be empty"));
    }
    if attrs.id.contains(RESERVED) {
        return Err(syn::Error::new(
            attrs.id_span,
            "callback id must not contain the reserved separators `~` or `¶`",
        ));
    }

    match &input.data {
        Data::Struct(data) => Ok(generate_impl(input, &attrs, &data.fields)),
        Data::Enum(_) => Err(syn::Error::new(
            input.span(),
            "CallbackData cannot be derived for enums",
        )),
        Data::Union(_) => Err(syn::Error::new(
            input.span(),
            "CallbackData cannot be derived for unions",
        )),
    }
}

// ============================================================================
// Attribute parsing
// ============================================================================

fn parse_struct_attrs(attrs: &[Attribute], ident: &syn::Ident) -> syn::Result<CallbackAttrs> {
    let mut id: Option<LitStr> = None;
    let mut krate: Option<Path> = None;

    for attr in attrs {
        if !attr.path().is_ident("callback") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                id = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("crate") {
                let lit: LitStr = meta.value()?.parse()?;
                krate = Some(lit.parse()?);
            } else {
                return Err(meta.error("unsupported callback attribute, expected `id` or `crate`"));
            }
            Ok(())
        })?;
    }

    let (id, id_span) = match id {
        Some(lit) => (lit.value(), lit.span()),
        None => (ident.to_string(), ident.span()),
    };
    let krate = match krate {
        Some(path) => path,
        None => syn::parse_quote!(::hookwire_core),
    };

    Ok(CallbackAttrs { id, id_span, krate })
}

// ============================================================================
// Code generation
// ============================================================================

fn generate_impl(input: &DeriveInput, attrs: &CallbackAttrs, fields: &Fields) -> TokenStream {
    let name = &input.ident;
    let krate = &attrs.krate;
    let id = &attrs.id;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let count = fields.len();
    let parsed = fields.iter().enumerate().map(|(i, f)| {
        let ty = &f.ty;
        let label = f
            .ident
            .as_ref()
            .map_or_else(|| i.to_string(), ToString::to_string);
        quote! {
            <#ty as ::core::str::FromStr>::from_str(fields[#i])
                .map_err(|e| #krate::DecodeError::invalid_field(#label, fields[#i], e))?
        }
    });

    let construct = match fields {
        Fields::Named(named) => {
            let idents = named.named.iter().map(|f| &f.ident);
            quote! { Self { #(#idents: #parsed),* } }
        }
        Fields::Unnamed(_) => quote! { Self(#(#parsed),*) },
        Fields::Unit => quote! { Self },
    };

    let rendered = fields.iter().enumerate().map(|(i, f)| match &f.ident {
        Some(ident) => quote! { ::std::string::ToString::to_string(&self.#ident) },
        None => {
            let index = syn::Index::from(i);
            quote! { ::std::string::ToString::to_string(&self.#index) }
        }
    });

    quote! {
        impl #impl_generics #krate::CallbackData for #name #ty_generics #where_clause {
            const CALLBACK_ID: &'static str = #id;

            fn from_fields(fields: &[&str]) -> #krate::DecodeResult<Self> {
                if fields.len() != #count {
                    return ::core::result::Result::Err(#krate::DecodeError::FieldCount {
                        expected: #count,
                        actual: fields.len(),
                    });
                }
                ::core::result::Result::Ok(#construct)
            }

            fn to_fields(&self) -> ::std::vec::Vec<::std::string::String> {
                ::std::vec![#(#rendered),*]
            }
        }
    }
}
