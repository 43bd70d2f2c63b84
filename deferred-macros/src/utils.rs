use proc_macro::{Spacing, TokenStream, TokenTree};

use std::mem;

/// Splits macro input into its comma-separated items.
///
/// Commas nested in a group belong to that group. Commas in turbofish
/// generics (`Deferred::<i32, String>::resolve(..)`) belong to the path:
/// a `<` right after `::` opens a generic list that the matching `>`
/// closes, and every `<` or `>` inside it nests. A `>` that ends `->` does
/// not close anything.
pub(crate) fn split_items(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut items = Vec::new();
    let mut current: Vec<TokenTree> = Vec::new();
    let mut generics = 0usize;

    for token in input {
        if let TokenTree::Punct(p) = &token {
            match p.as_char() {
                ',' if generics == 0 => {
                    if !current.is_empty() {
                        items.push(mem::take(&mut current));
                    }
                    continue;
                }
                '<' if generics > 0 || ends_with_path_sep(&current) => generics += 1,
                '>' if generics > 0 && !ends_with_joint(&current, '-') => generics -= 1,
                _ => {}
            }
        }

        current.push(token);
    }

    if !current.is_empty() {
        items.push(current);
    }

    items
}

fn ends_with_path_sep(tokens: &[TokenTree]) -> bool {
    matches!(
        tokens,
        [.., TokenTree::Punct(a), TokenTree::Punct(b)]
            if a.as_char() == ':' && a.spacing() == Spacing::Joint && b.as_char() == ':'
    )
}

fn ends_with_joint(tokens: &[TokenTree], ch: char) -> bool {
    matches!(
        tokens.last(),
        Some(TokenTree::Punct(p)) if p.as_char() == ch && p.spacing() == Spacing::Joint
    )
}

/// Converts a slice of tokens back into Rust source.
///
/// Tokens are separated by a space unless the previous one is a joint
/// punctuation character, so multi-character operators (`::`, `->`, `&&`)
/// survive and separate operators (`a & &b`) stay separate.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();

    for token in tokens {
        out.push_str(&token.to_string());

        if !matches!(token, TokenTree::Punct(p) if p.spacing() == Spacing::Joint) {
            out.push(' ');
        }
    }

    out.truncate(out.trim_end().len());
    out
}

/// Parses `race!` branches of the form `deferred_expr => handler_expr`.
///
/// Branches are separated by commas. Each branch is returned as a pair of
/// source strings, split at its first `=>`. A branch without an arrow or
/// with an empty side is reported as an error naming the branch.
pub(crate) fn parse_race_branches(input: TokenStream) -> Result<Vec<(String, String)>, String> {
    split_items(input)
        .into_iter()
        .map(|tokens| {
            let arrow = tokens.windows(2).position(|pair| {
                matches!(
                    pair,
                    [TokenTree::Punct(eq), TokenTree::Punct(gt)]
                        if eq.as_char() == '=' && eq.spacing() == Spacing::Joint && gt.as_char() == '>'
                )
            });

            let branch = tokens_to_string(&tokens);
            let Some(arrow) = arrow else {
                return Err(format!("race! branch `{branch}` is missing `=> handler`"));
            };

            let deferred = tokens_to_string(&tokens[..arrow]);
            let handler = tokens_to_string(&tokens[arrow + 2..]);

            if deferred.trim().is_empty() || handler.trim().is_empty() {
                return Err(format!("race! branch `{branch}` needs both a deferred value and a handler"));
            }

            Ok((deferred, handler))
        })
        .collect()
}

/// Makes a closure handler own its captures.
///
/// Handlers outlive the macro call site (they sit in a reaction queue until
/// the input settles), so a bare `|v| ..` closure is turned into
/// `move |v| ..`. Any other expression is left alone.
pub(crate) fn owning_handler(handler: &str) -> String {
    let trimmed = handler.trim_start();

    if trimmed.starts_with('|') {
        format!("move {trimmed}")
    } else {
        trimmed.to_string()
    }
}
