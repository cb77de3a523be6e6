use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Turn a function into a test, set up test logging, and inject an example
/// election and the clock driving it.
///
/// Injectable dependencies are `Election<ManualClock>` and `ManualClock`,
/// matched by type name. The optional argument picks the fixture stage:
/// `registered`, `started` or `ended`; without one the election is fresh.
#[proc_macro_attribute]
pub fn election_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Pick the fixture constructor.
    let stage = parse_macro_input!(args as Option<Ident>);
    let constructor = match stage {
        None => format_ident!("example"),
        Some(stage) if stage == "registered" || stage == "started" || stage == "ended" => {
            format_ident!("{}_example", stage)
        }
        Some(stage) => {
            return syn::Error::new(
                stage.span(),
                "Expected one of `registered`, `started` or `ended`",
            )
            .into_compile_error()
            .into();
        }
    };

    // Rename the body so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_body", name);
    item_fn.sig.ident = new_name.clone();

    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(
                ["election_engine"],
                None,
                None,
            );

            // Not every test takes both.
            #[allow(unused_variables)]
            let clock = crate::clock::ManualClock::example();
            #[allow(unused_variables)]
            let election = crate::model::Election::#constructor(clock.clone());

            #new_name(#(#test_args),*);
        }
    }
    .into()
}

/// Ensure the wrapped test is synchronous, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(sig.span(), "Test must not be `async`"));
    }

    let mut has_election = false;
    let mut has_clock = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    if type_ident == "Election" {
                        if has_election {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `Election`",
                            ));
                        }
                        has_election = true;
                        args.push(quote! { election });
                        continue;
                    } else if type_ident == "ManualClock" {
                        if has_clock {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `ManualClock`",
                            ));
                        }
                        has_clock = true;
                        args.push(quote! { clock });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `election_ident: Election<ManualClock>` or `clock_ident: ManualClock`",
        ));
    }

    Ok(args)
}
