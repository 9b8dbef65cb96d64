//! Resolves how generated code names the `phoenix_swap` crate.
//!
//! Consumers may depend on `phoenix_swap` directly (possibly renamed) or
//! only on the `phoenix` umbrella crate, which re-exports it.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Returns the path to `phoenix_swap` as seen from the calling crate.
pub(crate) fn phoenix_swap() -> TokenStream {
    match crate_name("phoenix_swap") {
        // `phoenix_swap` declares `extern crate self as phoenix_swap`.
        Ok(FoundCrate::Itself) => quote!(phoenix_swap),
        Ok(FoundCrate::Name(found)) => {
            let ident = format_ident!("{}", found);
            quote!(#ident)
        }
        Err(_) => match crate_name("phoenix") {
            Ok(FoundCrate::Name(found)) => {
                let phoenix = format_ident!("{}", found);
                quote!(#phoenix::phoenix_swap)
            }
            _ => quote!(phoenix_swap),
        },
    }
}
