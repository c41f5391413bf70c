use proc_macro::{Delimiter, TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`. Only top-level commas
/// separate arguments; commas inside groups stay inside their group token.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens into a Rust source string.
///
/// Consecutive identifiers are separated by a space so they do not merge
/// (e.g. `mut scope` vs `mutscope`).
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let needs_space = prev_was_ident && matches!(t, TokenTree::Ident(_));

        if needs_space {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = matches!(t, TokenTree::Ident(_));
    }

    out
}

/// Options accepted by `#[stratum::test(..)]`.
#[derive(Default)]
pub(crate) struct TestOptions {
    /// Run the test on a dedicated dispatcher of this size.
    pub(crate) worker_threads: Option<usize>,
}

/// Parses `worker_threads = N`.
///
/// Unknown keys are reported as an error message.
pub(crate) fn parse_test_options(attr: TokenStream) -> Result<TestOptions, String> {
    let mut options = TestOptions::default();

    for arg in split_args(attr) {
        let key = match arg.first() {
            Some(TokenTree::Ident(ident)) => ident.to_string(),
            _ => return Err(format!("expected `key = value`, found `{}`", tokens_to_string(&arg))),
        };

        let value = match arg.as_slice() {
            [_, TokenTree::Punct(eq), TokenTree::Literal(lit)] if eq.as_char() == '=' => {
                lit.to_string()
            }
            _ => return Err(format!("expected `{key} = <value>`")),
        };

        match key.as_str() {
            "worker_threads" => match value.parse::<usize>() {
                Ok(n) if n > 0 => options.worker_threads = Some(n),
                _ => return Err(format!("`worker_threads` must be a positive integer, found `{value}`")),
            },
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    Ok(options)
}

/// The parts of an `async fn` a test attribute needs to rewrite it.
pub(crate) struct TestFn {
    /// Everything before `fn` (outer attributes, visibility), minus `async`.
    pub(crate) prefix: Vec<TokenTree>,
    pub(crate) name: String,

    /// Contents of the parameter list.
    pub(crate) params: Vec<TokenTree>,

    /// Tokens after `->`, if a return type was written.
    pub(crate) output: Option<Vec<TokenTree>>,
    pub(crate) body: TokenStream,
}

/// Splits an item into the pieces of a function declaration.
pub(crate) fn parse_test_fn(item: TokenStream) -> Result<TestFn, String> {
    let mut tokens = item.into_iter().peekable();
    let mut prefix = Vec::new();

    loop {
        match tokens.next() {
            Some(TokenTree::Ident(ident)) if ident.to_string() == "fn" => break,
            Some(TokenTree::Ident(ident)) if ident.to_string() == "async" => {}
            Some(token) => prefix.push(token),
            None => return Err("expected a function".to_owned()),
        }
    }

    let name = match tokens.next() {
        Some(TokenTree::Ident(ident)) => ident.to_string(),
        _ => return Err("expected a function name".to_owned()),
    };

    let params = match tokens.next() {
        Some(TokenTree::Group(group)) if group.delimiter() == Delimiter::Parenthesis => {
            group.stream().into_iter().collect()
        }
        _ => return Err("generic test functions are not supported".to_owned()),
    };

    let rest: Vec<TokenTree> = tokens.collect();

    let Some((TokenTree::Group(body), signature)) = rest.split_last() else {
        return Err("expected a function body".to_owned());
    };

    if body.delimiter() != Delimiter::Brace {
        return Err("expected a function body".to_owned());
    }

    let output = match signature {
        [] => None,
        [TokenTree::Punct(dash), TokenTree::Punct(gt), ty @ ..]
            if dash.as_char() == '-' && gt.as_char() == '>' =>
        {
            Some(ty.to_vec())
        }
        _ => return Err("`where` clauses are not supported on tests".to_owned()),
    };

    Ok(TestFn {
        prefix,
        name,
        params,
        output,
        body: body.stream(),
    })
}

/// Expands to a `compile_error!` carrying `message`.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
