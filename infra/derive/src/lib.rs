#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the confhub workspace.
//!
//! The only macro currently exported is [`macro@confhub_error`], which every crate uses
//! to declare its error enum so that context propagation and source conversions
//! look the same across the domain, kernel and infrastructure layers.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context()`
///   to `Result<T, Name>` and to `Result<T, Source>` for every variant wrapping a source error.
/// * **Standard Conversions**: Implements `From<Source>` for variants with a `source` field,
///   enabling the `?` operator for upstream errors.
/// * **Kind Accessor**: Generates `fn kind(&self) -> &'static str` returning the variant name,
///   intended for structured log fields.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal { message, context }` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants wrapping an upstream error must declare a `source` field (or a field marked
///    `#[source]`/`#[from]`) and a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[confhub_derive::confhub_error]
/// pub enum StoreError {
///     #[error("Missing entry{}: {key}", format_context(.context))]
///     Missing { key: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<Vec<u8>, StoreError> {
///     std::fs::read("a.bin").context("Reading cache file")
/// }
/// ```
#[proc_macro_attribute]
pub fn confhub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
