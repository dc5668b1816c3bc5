use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Ident, ItemFn};

/// Proc macro to denote a Scenario
///
/// Applies to an `async fn` which takes no arguments and returns `Result<Iteration, E>` where `E`
/// implements `Display`. The function keeps its name but now returns a `Scenario`, which is
/// configured with `.vus()`, `.rps()` and `.duration()` and runs when awaited. The name of the
/// function is used as the scenario name in logs and reports.
///
/// # Example
/// ```ignore
/// use barrage::prelude::*;
///
/// #[scenario]
/// async fn apply_coupon() -> Result<Iteration, reqwest::Error> {
///     ...
/// }
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn scenario_internal(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[scenario] does not take arguments",
        ));
    }

    let input = syn::parse2::<ItemFn>(item)?;
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[scenario] must be applied to an async fn",
        ));
    }
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "#[scenario] functions take no arguments",
        ));
    }

    let inner_name = Ident::new(&format!("__barrage_{}", sig.ident), Span::call_site());
    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_name.clone();

    let scen_name = sig.ident.clone();
    let mut scen_sig = sig;
    scen_sig.asyncness = None;
    scen_sig.output = syn::parse2(quote! {
        -> impl ::barrage::scenario::ConfigurableScenario<::barrage::scenario::RunResult>
    })?;

    let stmts = &block.stmts;

    Ok(quote! {
        #(#attrs)* #vis #scen_sig {
            ::barrage::scenario::Scenario::new(stringify!(#scen_name), #inner_name)
        }

        #[doc(hidden)]
        #vis #inner_sig {
            #(#stmts)*
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_async_fn() {
        let out = scenario_internal(
            quote! {},
            quote! {
                async fn apply_coupon() -> Result<Iteration, Error> {
                    todo!()
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(out.contains("__barrage_apply_coupon"));
        assert_eq!(out.matches("__barrage_apply_coupon").count(), 2);
        assert!(out.contains("ConfigurableScenario"));
    }

    #[test]
    fn rejects_arguments() {
        let err = scenario_internal(
            quote! {},
            quote! {
                async fn apply_coupon(code: &str) -> Result<Iteration, Error> {
                    todo!()
                }
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("take no arguments"));
    }

    #[test]
    fn rejects_sync_fn() {
        let err = scenario_internal(
            quote! {},
            quote! {
                fn apply_coupon() -> Result<Iteration, Error> {
                    todo!()
                }
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("async fn"));
    }
}
