//! Stylesheet rewriting.
//!
//! Text-level scan for `url(...)` (bare, single- or double-quoted) and string
//! `@import` rules. No CSS parse: a token that cannot be resolved is left as it
//! was, and an unmatched token is never an error.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::rewrite::resolver::{Resolution, Resolver};

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^'")\s]+))\s*\)"#)
        .expect("valid CSS url regex")
});

static CSS_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).expect("valid CSS import regex")
});

/// Rewrite every `url(...)` and `@import "..."` reference in a stylesheet.
///
/// Returns the rewritten text and the number of references that were wrapped.
pub fn rewrite_css(css: &str, resolver: &Resolver<'_>) -> (String, usize) {
    let mut rewritten = 0;

    let with_urls = CSS_URL_RE.replace_all(css, |caps: &Captures<'_>| {
        match resolver.resolve(first_group(caps)) {
            Resolution::Proxied { href, .. } => {
                rewritten += 1;
                format!("url(\"{href}\")")
            }
            Resolution::Passthrough => caps[0].to_string(),
        }
    });

    let with_imports = CSS_IMPORT_RE.replace_all(&with_urls, |caps: &Captures<'_>| {
        match resolver.resolve(first_group(caps)) {
            Resolution::Proxied { href, .. } => {
                rewritten += 1;
                format!("@import \"{href}\"")
            }
            Resolution::Passthrough => caps[0].to_string(),
        }
    });

    (with_imports.into_owned(), rewritten)
}

fn first_group<'t>(caps: &Captures<'t>) -> &'t str {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str())
        .unwrap_or_default()
}
