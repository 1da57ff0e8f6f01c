//! Placeholder token scanning.
//!
//! A token is `[`, then any run of characters other than `]`, then `]`.
//! Names are case-sensitive and used verbatim as form and value-map keys.
//! Scanning is left to right and non-overlapping, so `[a [b]` is a single
//! token named `a [b`.

use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").expect("placeholder pattern is valid"));

/// A slice of scanned text: either plain text or a bracketed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// `raw` includes the brackets; `name` is what sits between them.
    Token { name: &'a str, raw: &'a str },
}

/// Split `text` into plain and token segments, in order.
///
/// Concatenating the `Text` slices and token `raw` slices yields `text`
/// exactly. Empty plain runs are not emitted.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Segment::Text(&text[last..whole.start()]));
        }
        out.push(Segment::Token {
            name: name.as_str(),
            raw: whole.as_str(),
        });
        last = whole.end();
    }

    if last < text.len() {
        out.push(Segment::Text(&text[last..]));
    }
    out
}

/// Placeholder names in `text`, in order of appearance (duplicates kept).
pub fn names(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}
