//! Content rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamResponse + RewriteContext
//!     → media.rs (classify declared media type)
//!     → html.rs      text/html → attributes, inline styles, runtime patch
//!     → css.rs       text/css  → url(...) and @import references
//!     → passthrough  anything else, bytes untouched
//!     → RewrittenBody (body, content type, reference count)
//!
//! resolver.rs: single resolution rule set used by html.rs, css.rs and,
//! through runtime.rs, by the injected client-side patch.
//! ```
//!
//! # Design Decisions
//! - Dispatch is total: every media type maps to exactly one branch
//! - Rewriting never fails the request; a broken document is relayed as-is

pub mod context;
pub mod css;
pub mod html;
pub mod media;
pub mod resolver;
pub mod runtime;

use bytes::Bytes;

pub use context::RewriteContext;
pub use media::ContentKind;
pub use resolver::{ProxyPrefix, Resolution, Resolver};

use crate::upstream::UpstreamResponse;

/// Body and content type ready for relay.
#[derive(Debug, Clone)]
pub struct RewrittenBody {
    pub body: Bytes,
    pub content_type: String,
    pub kind: ContentKind,
    /// References wrapped to point at the proxy.
    pub references: usize,
}

/// Rewrite an upstream body according to its declared media type.
pub fn rewrite_response(response: &UpstreamResponse, ctx: &RewriteContext) -> RewrittenBody {
    let kind = ContentKind::classify(response.media_type());

    match kind {
        ContentKind::Html => match html::rewrite_html(
            media::decode_text(&response.body, response.content_type()).as_bytes(),
            ctx,
        ) {
            Ok(output) => RewrittenBody {
                body: Bytes::from(output.body),
                content_type: media::HTML_UTF8.to_string(),
                kind,
                references: output.references,
            },
            Err(e) => {
                tracing::warn!(
                    target_url = %ctx.target(),
                    error = %e,
                    "HTML rewrite failed, relaying original document"
                );
                RewrittenBody {
                    body: response.body.clone(),
                    content_type: response.media_type().to_string(),
                    kind,
                    references: 0,
                }
            }
        },
        ContentKind::Css => {
            let text = media::decode_text(&response.body, response.content_type());
            let (css, references) = css::rewrite_css(&text, &ctx.resolver());
            RewrittenBody {
                body: Bytes::from(css),
                content_type: media::CSS.to_string(),
                kind,
                references,
            }
        }
        ContentKind::Passthrough => RewrittenBody {
            body: response.body.clone(),
            content_type: media::passthrough_content_type(response.content_type(), &response.final_url),
            kind,
            references: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;
    use url::Url;

    fn response(url: &str, content_type: Option<&'static str>, body: &'static str) -> UpstreamResponse {
        response_bytes(url, content_type, body.as_bytes())
    }

    fn response_bytes(url: &str, content_type: Option<&'static str>, body: &'static [u8]) -> UpstreamResponse {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
        UpstreamResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(body),
            final_url: Url::parse(url).unwrap(),
        }
    }

    fn context(url: &str) -> RewriteContext {
        RewriteContext::new(Url::parse(url).unwrap(), url, ProxyPrefix::default())
    }

    #[test]
    fn test_html_branch() {
        let upstream = response("https://example.com/", Some("text/html; charset=ISO-8859-1"), "<a href=\"/x\">x</a>");
        let out = rewrite_response(&upstream, &context("https://example.com/"));
        assert_eq!(out.kind, ContentKind::Html);
        assert_eq!(out.content_type, "text/html; charset=utf-8");
        assert_eq!(out.references, 1);
        assert!(std::str::from_utf8(&out.body).unwrap().contains("data-proxy-runtime"));
    }

    #[test]
    fn test_css_branch() {
        let upstream = response("https://example.com/s.css", Some("text/css; charset=utf-8"), "body{background:url(/bg.png)}");
        let out = rewrite_response(&upstream, &context("https://example.com/s.css"));
        assert_eq!(out.content_type, "text/css");
        assert_eq!(
            &out.body[..],
            br#"body{background:url("/proxy?url=https%3A%2F%2Fexample.com%2Fbg.png")}"#
        );
    }

    #[test]
    fn test_passthrough_is_byte_identical() {
        let upstream = response("https://example.com/app.js", Some("application/javascript"), "fetch('/api')");
        let out = rewrite_response(&upstream, &context("https://example.com/app.js"));
        assert_eq!(out.kind, ContentKind::Passthrough);
        assert_eq!(out.content_type, "application/javascript");
        assert_eq!(out.body, upstream.body);
    }

    #[test]
    fn test_missing_type_is_guessed_from_final_url() {
        let upstream = response("https://example.com/logo.png", None, "\u{89}PNG");
        let out = rewrite_response(&upstream, &context("https://example.com/logo.png"));
        assert_eq!(out.kind, ContentKind::Passthrough);
        assert_eq!(out.content_type, "image/png");
    }

    #[test]
    fn test_legacy_charset_is_transcoded_to_utf8() {
        let upstream = response_bytes(
            "https://example.com/",
            Some("text/html; charset=ISO-8859-1"),
            b"<p>Caf\xe9 cr\xe8me</p><a href=\"/men\xfc\">x</a>",
        );
        let out = rewrite_response(&upstream, &context("https://example.com/"));
        let body = std::str::from_utf8(&out.body).unwrap();
        assert_eq!(out.content_type, "text/html; charset=utf-8");
        assert!(body.contains("<p>Caf\u{e9} cr\u{e8}me</p>"));
        assert!(body.contains("/proxy?url=https%3A%2F%2Fexample.com%2Fmen%25C3%25BC"));
    }

    #[test]
    fn test_legacy_charset_stylesheet() {
        let upstream = response_bytes(
            "https://example.com/s.css",
            Some("text/css; charset=windows-1252"),
            b"p::before{content:\"\x93q\x94\"}",
        );
        let out = rewrite_response(&upstream, &context("https://example.com/s.css"));
        assert_eq!(std::str::from_utf8(&out.body).unwrap(), "p::before{content:\"\u{201c}q\u{201d}\"}");
    }
}
