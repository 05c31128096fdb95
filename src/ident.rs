//! Identifier casing: Rust/Go style field identifiers → GraphQL lowerCamelCase.
//!
//! Word splitting is `heck`'s. Plural initialisms (`IDs`, `URLs`) are folded
//! into one word first, otherwise the trailing `s` would start a word of its
//! own (`URLs` → `urLs`).
use std::borrow::Cow;

use heck::ToLowerCamelCase;

/// `BarBaz` → `barBaz`, `bar_baz` → `barBaz`, `DatabaseID` → `databaseId`,
/// `URLs` → `urls`.
pub fn to_lower_camel_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    fold_plural_initialisms(ident).to_lower_camel_case()
}

/// Rewrite `IDs` as `Ids` wherever a run of two or more capitals is followed
/// by a lone `s` that ends the word.
fn fold_plural_initialisms(ident: &str) -> Cow<'_, str> {
    let chars: Vec<char> = ident.chars().collect();
    let mut out: Option<String> = None;
    let mut i = 0;
    while i < chars.len() {
        let start = i;
        while i < chars.len() && chars[i].is_uppercase() {
            i += 1;
        }
        let run = i - start;
        let plural = run >= 2
            && chars.get(i) == Some(&'s')
            && chars.get(i + 1).is_none_or(|c| !c.is_lowercase());
        if plural {
            let buf = out.get_or_insert_with(|| chars[..start].iter().collect());
            buf.push(chars[start]);
            buf.extend(chars[start + 1..i].iter().flat_map(|c| c.to_lowercase()));
        } else if let Some(buf) = out.as_mut() {
            buf.extend(&chars[start..i]);
        }
        // copy the non-capital stretch up to the next run
        let rest = i;
        if i == start {
            i += 1;
        }
        while i < chars.len() && !chars[i].is_uppercase() {
            i += 1;
        }
        if let Some(buf) = out.as_mut() {
            buf.extend(&chars[rest..i]);
        }
    }
    match out {
        Some(s) => Cow::Owned(s),
        None => Cow::Borrowed(ident),
    }
}
