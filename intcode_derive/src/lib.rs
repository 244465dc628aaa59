//! Derive macros for the intcode crate.
//!
//! Provides `#[derive(Error)]`, which implements `Display`, `std::error::Error`
//! and `From` conversions for error enums.

mod error;

use proc_macro::TokenStream;

/// Implements `Display`, `Error` and `#[from]` conversions for an error enum.
#[proc_macro_derive(Error, attributes(error, from))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
