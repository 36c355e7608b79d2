//! String matching primitives used by the rename rules.
//!
//! Two disciplines exist: exact equality, and namespace-prefix matching on the
//! `"<namespace>:"` boundary of compound tags. All functions are pure and
//! total. Non-string array elements pass through untouched.

use serde_json::Value;
use std::borrow::Cow;

/// Separator between a compound tag's namespace and value.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Build the `"<namespace>:"` prefix for a namespace id.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}")
}

/// Returns `to` if `value == from`, else `value`.
pub fn replace_exact<'a>(value: &'a str, from: &str, to: &'a str) -> &'a str {
    if value == from {
        to
    } else {
        value
    }
}

/// Swap a leading `from_prefix` for `to_prefix`; other values are returned
/// unchanged.
pub fn replace_prefix<'a>(value: &'a str, from_prefix: &str, to_prefix: &str) -> Cow<'a, str> {
    match value.strip_prefix(from_prefix) {
        Some(rest) => Cow::Owned(format!("{to_prefix}{rest}")),
        None => Cow::Borrowed(value),
    }
}

/// Apply [`replace_exact`] to every string element.
///
/// Order and duplicates are preserved. `changed` is true iff any element
/// differs from the input.
pub fn replace_in_array(list: &[Value], from: &str, to: &str) -> (bool, Vec<Value>) {
    map_strings(list, |s| {
        let next = replace_exact(s, from, to);
        (next != s).then(|| next.to_string())
    })
}

/// Rewrite the namespace segment of every compound tag in `group_from`.
///
/// Only the `"<group_from>:"` prefix matches, so a tag whose value segment
/// happens to equal `group_from` is left alone.
pub fn replace_group_prefix_in_array(
    list: &[Value],
    group_from: &str,
    group_to: &str,
) -> (bool, Vec<Value>) {
    let prefix_from = namespace_prefix(group_from);
    let prefix_to = namespace_prefix(group_to);
    map_strings(list, |s| match replace_prefix(s, &prefix_from, &prefix_to) {
        Cow::Owned(next) if next != s => Some(next),
        _ => None,
    })
}

fn map_strings(list: &[Value], rewrite: impl Fn(&str) -> Option<String>) -> (bool, Vec<Value>) {
    let mut changed = false;
    let out = list
        .iter()
        .map(|item| match item.as_str().and_then(&rewrite) {
            Some(next) => {
                changed = true;
                Value::String(next)
            }
            None => item.clone(),
        })
        .collect();
    (changed, out)
}
