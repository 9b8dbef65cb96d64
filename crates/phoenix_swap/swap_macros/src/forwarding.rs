//! Code generation for `#[forwarding]`.

use proc_macro2::{Span, TokenStream, TokenTree};
use quote::{ToTokens, format_ident, quote};
use syn::{
    FnArg, GenericParam, Ident, ItemTrait, Pat, PatIdent, ReturnType, Signature, TraitItem,
    TraitItemFn, WherePredicate,
};

/// Emits the trait unchanged, followed by its proxy impl or the errors that
/// prevent one.
pub(crate) fn expand(input: &ItemTrait, phoenix_swap: &TokenStream) -> TokenStream {
    match proxy_impl(input, phoenix_swap) {
        Ok(generated) => quote! {
            #input
            #generated
        },
        Err(err) => {
            let err = err.to_compile_error();
            quote! {
                #input
                #err
            }
        }
    }
}

fn proxy_impl(input: &ItemTrait, phoenix_swap: &TokenStream) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() || input.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[forwarding] does not support generic traits",
        ));
    }
    if let Some(unsafety) = &input.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "#[forwarding] cannot be applied to unsafe traits",
        ));
    }

    let trait_ident = &input.ident;
    let target = format_ident!("__PhoenixTarget");

    let mut errors: Option<syn::Error> = None;
    let mut methods = Vec::new();
    for item in &input.items {
        let forwarded = match item {
            TraitItem::Fn(method) => forward_method(method, trait_ident, &target, phoenix_swap),
            TraitItem::Type(ty) => Err(syn::Error::new_spanned(
                &ty.ident,
                "#[forwarding] does not support associated types",
            )),
            TraitItem::Const(constant) => Err(syn::Error::new_spanned(
                &constant.ident,
                "#[forwarding] does not support associated constants",
            )),
            other => Err(syn::Error::new_spanned(
                other,
                "#[forwarding] only supports method items",
            )),
        };
        match forwarded {
            Ok(tokens) => methods.push(tokens),
            Err(err) => push_error(&mut errors, err),
        }
    }
    if let Some(err) = errors {
        return Err(err);
    }

    Ok(quote! {
        #[automatically_derived]
        impl<#target> #trait_ident for #phoenix_swap::ForwardingProxy<#target>
        where
            #target: ?::core::marker::Sized
                + #trait_ident
                + ::core::marker::Send
                + ::core::marker::Sync
                + 'static,
        {
            #(#methods)*
        }
    })
}

fn forward_method(
    method: &TraitItemFn,
    trait_ident: &Ident,
    target: &Ident,
    phoenix_swap: &TokenStream,
) -> syn::Result<TokenStream> {
    validate_signature(&method.sig)?;

    let mut sig = method.sig.clone();
    let mut args = Vec::new();
    for (index, input) in sig.inputs.iter_mut().enumerate() {
        if let FnArg::Typed(arg) = input {
            let ident = format_ident!("__arg{}", index);
            *arg.pat = Pat::Ident(PatIdent {
                attrs: Vec::new(),
                by_ref: None,
                mutability: None,
                ident: ident.clone(),
                subpat: None,
            });
            args.push(ident);
        }
    }

    let method_ident = &sig.ident;
    let explicit: Vec<&Ident> = sig
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(&ty.ident),
            GenericParam::Const(constant) => Some(&constant.ident),
            GenericParam::Lifetime(_) => None,
        })
        .collect();
    let turbofish = if explicit.is_empty() {
        TokenStream::new()
    } else {
        quote!(::<#(#explicit),*>)
    };

    let cfgs = method.attrs.iter().filter(|attr| attr.path().is_ident("cfg"));

    Ok(quote! {
        #(#cfgs)*
        #[inline]
        #sig {
            #phoenix_swap::ForwardingProxy::forward(self, move |__target: &#target| {
                <#target as #trait_ident>::#method_ident #turbofish(__target, #(#args),*)
            })
        }
    })
}

fn validate_signature(sig: &Signature) -> syn::Result<()> {
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "#[forwarding] does not support async methods",
        ));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "#[forwarding] does not support unsafe methods",
        ));
    }
    if let Some(abi) = &sig.abi {
        return Err(syn::Error::new_spanned(
            abi,
            "#[forwarding] does not support extern methods",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(
            variadic,
            "#[forwarding] does not support variadic methods",
        ));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() => {}
        Some(FnArg::Receiver(receiver)) => {
            return Err(syn::Error::new_spanned(
                receiver,
                "forwarded methods must take `&self`; proxies only hold shared access to the instance",
            ));
        }
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "forwarded methods must take `&self`; associated functions cannot be forwarded",
            ));
        }
    }

    if let Some(where_clause) = &sig.generics.where_clause {
        for predicate in &where_clause.predicates {
            if let WherePredicate::Type(bound) = predicate
                && let Some(span) = find_ident(bound.bounded_ty.to_token_stream(), "Self")
            {
                return Err(syn::Error::new(
                    span,
                    "#[forwarding] does not support methods with bounds on `Self`",
                ));
            }
        }
    }

    for input in sig.inputs.iter().skip(1) {
        if let FnArg::Typed(arg) = input
            && let Some(span) = find_ident(arg.ty.to_token_stream(), "Self")
        {
            return Err(syn::Error::new(
                span,
                "`Self` in argument types cannot be forwarded",
            ));
        }
    }

    if let ReturnType::Type(_, ty) = &sig.output {
        let tokens = ty.to_token_stream();
        if let Some(span) = find_ident(tokens.clone(), "Self") {
            return Err(syn::Error::new(span, "`Self` in return types cannot be forwarded"));
        }
        if let Some(span) = find_ident(tokens.clone(), "impl") {
            return Err(syn::Error::new(
                span,
                "#[forwarding] does not support `impl Trait` return types",
            ));
        }
        if let Some(span) = borrow_span(tokens) {
            return Err(syn::Error::new(
                span,
                "forwarded methods cannot return borrows; the instance may be replaced once the call returns",
            ));
        }
    }

    Ok(())
}

fn push_error(errors: &mut Option<syn::Error>, err: syn::Error) {
    match errors {
        Some(existing) => existing.combine(err),
        None => *errors = Some(err),
    }
}

/// Finds `name` as an identifier anywhere in `tokens`.
fn find_ident(tokens: TokenStream, name: &str) -> Option<Span> {
    tokens.into_iter().find_map(|token| match token {
        TokenTree::Ident(ident) if ident == name => Some(ident.span()),
        TokenTree::Group(group) => find_ident(group.stream(), name),
        _ => None,
    })
}

/// Finds a reference or lifetime other than `'static`.
fn borrow_span(tokens: TokenStream) -> Option<Span> {
    let tokens: Vec<TokenTree> = tokens.into_iter().collect();
    for (index, token) in tokens.iter().enumerate() {
        match token {
            TokenTree::Group(group) => {
                if let Some(span) = borrow_span(group.stream()) {
                    return Some(span);
                }
            }
            TokenTree::Punct(punct) if punct.as_char() == '&' => {
                if !is_static_lifetime(&tokens[index + 1..]) {
                    return Some(punct.span());
                }
            }
            TokenTree::Punct(punct) if punct.as_char() == '\'' => {
                if !is_static_lifetime(&tokens[index..]) {
                    return Some(punct.span());
                }
            }
            _ => {}
        }
    }
    None
}

fn is_static_lifetime(tokens: &[TokenTree]) -> bool {
    matches!(
        tokens,
        [TokenTree::Punct(quote), TokenTree::Ident(ident), ..]
            if quote.as_char() == '\'' && ident == "static"
    )
}
