//! Derive macro for error enums.
//!
//! Generates `std::fmt::Display`, `std::error::Error` and, for variants whose single
//! field is marked `#[from]`, a `From` conversion plus `Error::source`.
//!
//! # Usage
//!
//! ```ignore
//! use intcode_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MachineError {
//!     #[error("unsupported opcode {opcode} at {ip}")]
//!     UnsupportedOpcode { opcode: i64, ip: usize },
//!
//!     #[error("bad token {0:?}")]
//!     BadToken(String),
//!
//!     #[error("io error: {0}")]
//!     Io(#[from] std::io::Error),
//!
//!     #[error("input closed")]
//!     InputClosed,
//! }
//! ```
//!
//! Only the fields a message mentions are bound, so messages may leave fields out.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, Variant, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let mut display_arms = Vec::new();
    let mut source_arms = Vec::new();
    let mut from_impls = Vec::new();

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;
        let message = error_message(variant)?;

        let arm = match &variant.fields {
            Fields::Unit => quote! {
                Self::#variant_name => write!(f, #message),
            },
            Fields::Unnamed(fields) => {
                let count = fields.unnamed.len();
                let message = positional_to_named(&message, count);
                let mut bindings = Vec::with_capacity(count);
                let mut args = Vec::new();
                for i in 0..count {
                    let ident = format_ident!("f{}", i);
                    if mentions(&message, &ident.to_string()) {
                        args.push(quote! { #ident = #ident });
                        bindings.push(quote! { #ident });
                    } else {
                        bindings.push(quote! { _ });
                    }
                }
                quote! {
                    Self::#variant_name(#(#bindings),*) => write!(f, #message #(, #args)*),
                }
            }
            Fields::Named(fields) => {
                let used: Vec<_> = fields
                    .named
                    .iter()
                    .filter_map(|field| field.ident.as_ref())
                    .filter(|ident| mentions(&message, &ident.to_string()))
                    .collect();
                quote! {
                    Self::#variant_name { #(#used,)* .. } => write!(f, #message #(, #used = #used)*),
                }
            }
        };
        display_arms.push(arm);

        if let Some(source_ty) = from_field(variant)? {
            source_arms.push(quote! {
                Self::#variant_name(source) => Some(source as &(dyn ::std::error::Error + 'static)),
            });
            from_impls.push(quote! {
                impl #impl_generics ::std::convert::From<#source_ty> for #name #ty_generics #where_clause {
                    fn from(source: #source_ty) -> Self {
                        Self::#variant_name(source)
                    }
                }
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#display_arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {
            #[allow(unreachable_patterns)]
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                match self {
                    #(#source_arms)*
                    _ => None,
                }
            }
        }

        #(#from_impls)*
    })
}

/// Returns the type of a variant's `#[from]` field, if it has one.
///
/// `#[from]` is only accepted on a tuple variant with exactly one field.
fn from_field(variant: &Variant) -> syn::Result<Option<&syn::Type>> {
    let Fields::Unnamed(fields) = &variant.fields else {
        return Ok(None);
    };

    let marked = fields
        .unnamed
        .iter()
        .find(|field| field.attrs.iter().any(|attr| attr.path().is_ident("from")));

    match marked {
        None => Ok(None),
        Some(field) if fields.unnamed.len() == 1 => Ok(Some(&field.ty)),
        Some(field) => Err(syn::Error::new_spanned(
            field,
            "#[from] requires the variant to have exactly one field",
        )),
    }
}

/// Extracts the message from a variant's `#[error("...")]` attribute.
fn error_message(variant: &Variant) -> syn::Result<String> {
    for attr in &variant.attrs {
        if !attr.path().is_ident("error") {
            continue;
        }

        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")]",
            ));
        };

        return match syn::parse2::<Lit>(meta_list.tokens.clone()) {
            Ok(Lit::Str(lit_str)) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "#[error] message must be a string literal, e.g. #[error(\"bad opcode {0}\")]",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        &variant.ident,
        format!(
            "missing #[error(\"...\")] attribute on variant `{}`",
            variant.ident
        ),
    ))
}

/// Whether `message` interpolates the argument `name`, as `{name}` or `{name:...}`.
fn mentions(message: &str, name: &str) -> bool {
    let open = format!("{{{}", name);
    message.match_indices(&open).any(|(at, _)| {
        let escaped = at > 0 && message[..at].ends_with('{');
        let next = message[at + open.len()..].chars().next();
        !escaped && matches!(next, Some('}') | Some(':'))
    })
}

/// Rewrites positional arguments `{0}`, `{1:?}` into named ones `{f0}`, `{f1:?}`.
fn positional_to_named(message: &str, field_count: usize) -> String {
    let mut result = message.to_string();
    for i in (0..field_count).rev() {
        for close in ['}', ':'] {
            let positional = format!("{{{}{}", i, close);
            let named = format!("{{f{}{}", i, close);
            result = result.replace(&positional, &named);
        }
    }
    result
}
