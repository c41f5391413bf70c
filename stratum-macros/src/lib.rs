mod utils;

use proc_macro::TokenStream;

/// Runs an `async fn` test inside a blocking scope.
///
/// The function may take the scope as its single parameter and may return
/// `stratum::Result<T>`; a returned `Err` fails the test. Without a return
/// type the body runs to completion and the test passes unless it panics.
///
/// ```rust,ignore
/// #[stratum::test]
/// async fn launches(scope: Scope) -> stratum::Result<()> {
///     scope.launch(async { Ok(()) })?;
///     Ok(())
/// }
///
/// #[stratum::test(worker_threads = 1)]
/// async fn single_worker() {
///     assert!(stratum::task::current_id().is_some());
/// }
/// ```
///
/// With `worker_threads = N`, the test runs on a dedicated dispatcher of
/// `N` workers, shut down when the test returns.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match utils::parse_test_options(attr) {
        Ok(options) => options,
        Err(message) => return utils::compile_error(&message),
    };

    let function = match utils::parse_test_fn(item) {
        Ok(function) => function,
        Err(message) => return utils::compile_error(&message),
    };

    let prefix = utils::tokens_to_string(&function.prefix);
    let name = &function.name;
    let body = function.body.to_string();

    let param = if function.params.is_empty() {
        "_scope".to_owned()
    } else {
        utils::tokens_to_string(&function.params)
    };

    let block = match &function.output {
        Some(output) => format!(
            "{{ let __outcome: {} = {{ {body} }}; __outcome }}",
            utils::tokens_to_string(output)
        ),
        None => format!(
            "{{ {{ {body} }}; ::core::result::Result::<(), ::stratum::Error>::Ok(()) }}"
        ),
    };

    let run = match options.worker_threads {
        Some(n) => format!(
            "let __dispatcher = ::stratum::Dispatcher::builder()
                .worker_threads({n})
                .name(\"{name}\")
                .build()
                .unwrap_or_else(|err| panic!(\"failed to start test dispatcher: {{err}}\"));
            let __result = ::stratum::run_blocking_on(&__dispatcher, |{param}| async move {block});
            __dispatcher.shutdown();"
        ),
        None => format!("let __result = ::stratum::run_blocking(|{param}| async move {block});"),
    };

    let expanded = format!(
        "#[::core::prelude::v1::test]
        {prefix} fn {name}() {{
            {run}
            if let ::core::result::Result::Err(err) = __result {{
                panic!(\"test body failed: {{err}}\");
            }}
        }}"
    );

    expanded
        .parse()
        .unwrap_or_else(|err| utils::compile_error(&format!("stratum::test expansion failed: {err}")))
}
