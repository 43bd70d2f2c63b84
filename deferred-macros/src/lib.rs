mod utils;

use proc_macro::TokenStream;

/// Fails macro expansion with `message`.
fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}

/// Waits for several deferred values of possibly different types.
///
/// `all!(a, b, c)` returns a `Deferred<(A, B, C), E>` that fulfils with the
/// values in argument order once every input has fulfilled, and rejects as
/// soon as any input rejects. All inputs must share the same reason type.
#[proc_macro]
pub fn all(input: TokenStream) -> TokenStream {
    let args = utils::split_items(input);
    let count = args.len();

    if count == 0 {
        return compile_error("all! expects at least one deferred value");
    }

    if count == 1 {
        let expr = utils::tokens_to_string(&args[0]);
        return format!("{{ ({expr}).map(|__v| (__v,)) }}")
            .parse()
            .unwrap_or_else(|err| compile_error(&format!("all macro error: {err}")));
    }

    let mut output = String::new();
    output.push_str("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let idx = i + 1;
        let expr = utils::tokens_to_string(expr_tokens);
        output.push_str(&format!("let __d{idx} = {expr};\n"));
    }

    output.push_str(
        "::deferred::__private::derive(&__d1, |__resolver, __rejecter| {\n\
         let __gathered = ::std::sync::Arc::new(::deferred::__private::Mutex::new((\n",
    );
    for _ in 0..count {
        output.push_str("::core::option::Option::None,\n");
    }
    output.push_str("0usize,\n)));\n");

    let take_all = (0..count)
        .map(|i| format!("__slots.{i}.take().unwrap(),"))
        .collect::<Vec<_>>()
        .join(" ");

    for i in 0..count {
        let idx = i + 1;
        output.push_str(&format!(
            "{{\n\
                let __gathered = __gathered.clone();\n\
                let __resolver = __resolver.clone();\n\
                let __rejecter = __rejecter.clone();\n\
                __d{idx}.then(\n\
                    move |__value| {{\n\
                        let __complete = {{\n\
                            let mut __slots = __gathered.lock();\n\
                            __slots.{i} = ::core::option::Option::Some(__value);\n\
                            __slots.{count} += 1;\n\
                            if __slots.{count} == {count} {{\n\
                                ::core::option::Option::Some(({take_all}))\n\
                            }} else {{\n\
                                ::core::option::Option::None\n\
                            }}\n\
                        }};\n\
                        if let ::core::option::Option::Some(__values) = __complete {{\n\
                            __resolver.resolve(__values);\n\
                        }}\n\
                        ::core::result::Result::Ok(::deferred::Resolution::Value(()))\n\
                    }},\n\
                    move |__reason| {{\n\
                        __rejecter.reject(__reason);\n\
                        ::core::result::Result::Ok(::deferred::Resolution::Value(()))\n\
                    }},\n\
                );\n\
            }}\n"
        ));
    }

    output.push_str("::core::result::Result::Ok(())\n");
    output.push_str("})\n");
    output.push_str("}\n");

    output
        .parse()
        .unwrap_or_else(|err| compile_error(&format!("all macro error: {err}")))
}

/// Settles with whichever input settles first, mapped through its branch.
///
/// ```text
/// race! {
///     fast => |v| v.len(),
///     slow => |n| n as usize,
/// }
/// ```
///
/// Every handler must produce the same type. A rejection from the winning
/// input is passed through unmapped.
#[proc_macro]
pub fn race(input: TokenStream) -> TokenStream {
    let branches = match utils::parse_race_branches(input) {
        Ok(branches) => branches,
        Err(message) => return compile_error(&message),
    };

    if branches.is_empty() {
        return compile_error("race! expects at least one `deferred => handler` branch");
    }

    let mapped = branches
        .iter()
        .map(|(deferred, handler)| {
            format!("({deferred}).map({})", utils::owning_handler(handler))
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("::deferred::Deferred::race(::std::vec![\n{mapped}\n])")
        .parse()
        .unwrap_or_else(|err| compile_error(&format!("race macro error: {err}")))
}
