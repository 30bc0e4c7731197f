//! HTML document rewriting.
//!
//! Streaming rewrite with `lol_html`: every resource and navigation attribute
//! is passed through the document's [`Resolver`], inline styles go through the
//! CSS rewriter, and the runtime patch is prepended to `<head>` (falling back
//! to `<body>`, then to the start of the document).

use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, Element};
use lol_html::{element, text, HandlerResult, HtmlRewriter, Settings};

use crate::rewrite::context::RewriteContext;
use crate::rewrite::css::rewrite_css;
use crate::rewrite::resolver::{Resolution, Resolver};
use crate::rewrite::runtime::runtime_script;

/// Result of rewriting one document.
#[derive(Debug)]
pub struct HtmlOutput {
    pub body: Vec<u8>,
    /// Number of references wrapped.
    pub references: usize,
    pub runtime_injected: bool,
}

/// (selector, attribute) pairs holding a single URL.
const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a[href]", "href"),
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("iframe[src]", "src"),
    ("form[action]", "action"),
    ("source[src]", "src"),
    ("video[src]", "src"),
    ("video[poster]", "poster"),
    ("audio[src]", "src"),
    ("track[src]", "src"),
    ("embed[src]", "src"),
];

/// Rewrite an HTML document.
pub fn rewrite_html(html: &[u8], ctx: &RewriteContext) -> Result<HtmlOutput, RewritingError> {
    let resolver = ctx.resolver();
    let references = Cell::new(0usize);
    let injected = Cell::new(false);
    let style_buffer = RefCell::new(String::new());
    let script = if ctx.inject_runtime() {
        Some(runtime_script(ctx))
    } else {
        None
    };

    let mut handlers = Vec::with_capacity(URL_ATTRIBUTES.len() + 8);

    for &(selector, attribute) in URL_ATTRIBUTES {
        let (resolver, references) = (&resolver, &references);
        handlers.push(element!(selector, move |el| {
            rewrite_url_attribute(el, attribute, resolver, references)
        }));
    }

    // Stylesheet, manifest and every other rel share one rule.
    handlers.push(element!("link[href]", |el| {
        rewrite_url_attribute(el, "href", &resolver, &references)?;
        if is_stylesheet(el) {
            // The body is rewritten, so the original digest can never match.
            el.remove_attribute("integrity");
        }
        Ok(())
    }));

    handlers.push(element!("img[srcset], source[srcset]", |el| {
        if let Some(value) = el.get_attribute("srcset") {
            let (rewritten, count) = rewrite_srcset(&decode_entities(&value), &resolver);
            if count > 0 {
                el.set_attribute("srcset", &rewritten)?;
                references.set(references.get() + count);
            }
        }
        Ok(())
    }));

    handlers.push(element!("[style]", |el| {
        if let Some(value) = el.get_attribute("style") {
            let (rewritten, count) = rewrite_css(&decode_entities(&value), &resolver);
            if count > 0 {
                el.set_attribute("style", &rewritten)?;
                references.set(references.get() + count);
            }
        }
        Ok(())
    }));

    handlers.push(text!("style", |chunk| {
        style_buffer.borrow_mut().push_str(chunk.as_str());
        if chunk.last_in_text_node() {
            let css = std::mem::take(&mut *style_buffer.borrow_mut());
            let (rewritten, count) = rewrite_css(&css, &resolver);
            references.set(references.get() + count);
            chunk.replace(&rewritten, ContentType::Html);
        } else {
            chunk.remove();
        }
        Ok(())
    }));

    handlers.push(element!("meta[http-equiv]", |el| {
        if el
            .get_attribute("http-equiv")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("content-security-policy"))
        {
            el.remove();
        }
        Ok(())
    }));

    if let Some(script) = script.as_deref() {
        let (injected, script) = (&injected, script);
        handlers.push(element!("head, body", move |el| {
            if !injected.get() {
                el.prepend(script, ContentType::Html);
                injected.set(true);
            }
            Ok(())
        }));
    }

    let mut body = Vec::with_capacity(html.len() + script.as_ref().map_or(0, String::len));
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |c: &[u8]| body.extend_from_slice(c),
    );
    rewriter.write(html)?;
    rewriter.end()?;

    if let Some(script) = script.as_deref() {
        if !injected.get() {
            let mut prefixed = Vec::with_capacity(script.len() + body.len());
            prefixed.extend_from_slice(script.as_bytes());
            prefixed.extend_from_slice(&body);
            body = prefixed;
            injected.set(true);
        }
    }

    Ok(HtmlOutput {
        body,
        references: references.get(),
        runtime_injected: injected.get(),
    })
}

fn rewrite_url_attribute(
    el: &mut Element<'_, '_>,
    attribute: &str,
    resolver: &Resolver<'_>,
    references: &Cell<usize>,
) -> HandlerResult {
    let Some(value) = el.get_attribute(attribute) else {
        return Ok(());
    };
    if let Resolution::Proxied { href, .. } = resolver.resolve(&decode_entities(&value)) {
        el.set_attribute(attribute, &href)?;
        references.set(references.get() + 1);
    }
    Ok(())
}

fn is_stylesheet(el: &Element<'_, '_>) -> bool {
    el.get_attribute("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

/// Rewrite each candidate URL of a `srcset` list, keeping its descriptor.
fn rewrite_srcset(srcset: &str, resolver: &Resolver<'_>) -> (String, usize) {
    let mut candidates = Vec::new();
    let mut count = 0;
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let (raw_url, after) = rest.split_at(url_end);

        // A URL followed directly by a comma has no descriptor.
        let (url, descriptor, remaining) = match raw_url.strip_suffix(',') {
            Some(url) => (url.trim_end_matches(','), "", after),
            None => {
                let descriptor_end = after.find(',').unwrap_or(after.len());
                (raw_url, after[..descriptor_end].trim(), &after[descriptor_end..])
            }
        };
        rest = remaining;

        let url = match resolver.resolve(url) {
            Resolution::Proxied { href, .. } => {
                count += 1;
                Cow::Owned(href)
            }
            Resolution::Passthrough => Cow::Borrowed(url),
        };

        if descriptor.is_empty() {
            candidates.push(url.into_owned());
        } else {
            candidates.push(format!("{url} {descriptor}"));
        }
    }

    (candidates.join(", "), count)
}

// Attribute values arrive as written in the source; undo the entity escapes
// that commonly appear inside URLs and inline styles.
fn decode_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace("&quot;", "\"")
            .replace("&#34;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&"),
    )
}
