//! Macros for the `phoenix_swap` crate.

mod crate_path;
mod forwarding;

use proc_macro::TokenStream;

/// Implements a trait for `ForwardingProxy<R>` whenever `R` implements it.
///
/// Every method of the trait is forwarded: the proxy passes its handle's
/// barrier, snapshots the installed instance and calls the same method on
/// it. A proxy can then stand in for the resource anywhere the trait is
/// expected, and keeps working across rebuilds.
///
/// # Requirements
///
/// - every method takes `&self`
/// - methods are not `async`, `unsafe` or `extern`
/// - return values do not borrow from `self` (`&'static` is fine)
/// - `Self` appears only as the receiver
/// - the trait has no generic parameters, associated types or constants
/// - supertraits other than auto traits must be implemented for the proxy
///   too, for example by marking them `#[forwarding]` as well
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use phoenix_swap::{forwarding, ConstructionParams, Properties, ResourceRegistry};
///
/// #[forwarding]
/// pub trait Pool: Send + Sync {
///     fn size(&self) -> usize;
///     fn checkout(&self, client: &str) -> Result<u64, String>;
/// }
///
/// struct Fixed(usize);
///
/// impl Pool for Fixed {
///     fn size(&self) -> usize {
///         self.0
///     }
///     fn checkout(&self, client: &str) -> Result<u64, String> {
///         if client.is_empty() { Err("anonymous client".into()) } else { Ok(1) }
///     }
/// }
///
/// let registry = ResourceRegistry::<dyn Pool>::new();
/// let pool = registry
///     .register(Arc::new(Fixed(8)), ConstructionParams::named("main", Properties::new()))
///     .unwrap();
///
/// fn report(pool: &impl Pool) -> usize {
///     pool.size()
/// }
///
/// assert_eq!(report(&pool), 8);
/// assert!(pool.checkout("").is_err());
/// ```
#[proc_macro_attribute]
pub fn forwarding(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    if !attr.is_empty() {
        return syn::Error::new_spanned(attr, "#[forwarding] takes no arguments")
            .to_compile_error()
            .into();
    }

    let input = syn::parse_macro_input!(item as syn::ItemTrait);
    forwarding::expand(&input, &crate_path::phoenix_swap()).into()
}
