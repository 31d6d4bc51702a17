use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::clock::ManualClock`, which drives the server's notion of time and
/// starts at zero. The server uses an in-memory store by default.
///
/// `#[backend_test(mongodb)]` runs against a fresh MongoDB database instead,
/// which is dropped regardless of how the test terminates. Such tests need a
/// live server, so they are ignored unless requested with `--ignored`.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Pick the store.
    let use_mongodb = match parse_macro_input!(args as Option<Ident>) {
        None => false,
        Some(arg) if arg == "mongodb" => true,
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected no argument or `mongodb`")
                .into_compile_error()
                .into();
        }
    };
    let (store, maybe_ignore) = if use_mongodb {
        (
            quote! { crate::config::StoreKind::Mongodb },
            quote! { #[ignore = "needs a MongoDB server"] },
        )
    } else {
        (quote! { crate::config::StoreKind::Memory }, quote! {})
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Rewrite the test function.
    quote! {
        #[test]
        #maybe_ignore
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                crate::clock::ManualClock,
                Option<mongodb::Database>,
            ) {
                let clock = crate::clock::ManualClock::new(0);
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::test_rocket(#store, clock.clone()),
                )
                .await
                .unwrap();
                let db = rocket_client.rocket().state::<mongodb::Database>().cloned();
                (rocket_client, clock, db)
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: Option<mongodb::Database>) {
                if let Some(db) = db {
                    db.drop(None).await.unwrap();
                }
            }

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let (rocket_client, clock, db) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let clock_mutex = std::sync::Mutex::new(clock);
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let rocket_client = client_mutex.into_inner().unwrap();
                let clock = clock_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                runtime.block_on(#new_name(#(#test_args),*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, map its parameters to injected values,
/// and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_clock = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(type_ident) = type_path.path.get_ident() {
                        if type_ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                            }
                            has_client = true;
                            args.push(quote! { rocket_client });
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
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `clock_ident: ManualClock`",
        ));
    }

    Ok(args)
}
