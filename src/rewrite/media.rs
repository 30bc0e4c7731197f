//! Media-type classification.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use url::Url;

/// Fallback when neither the upstream nor the URL says anything useful.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type attached to rewritten HTML.
pub const HTML_UTF8: &str = "text/html; charset=utf-8";

/// Content type attached to rewritten stylesheets.
pub const CSS: &str = "text/css";

const WASM: &str = "application/wasm";

/// How a response body is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Css,
    Passthrough,
}

impl ContentKind {
    /// Classify a declared media type. Total: anything unknown is passthrough.
    pub fn classify(media_type: &str) -> Self {
        let media_type = media_type.to_ascii_lowercase();
        if media_type.contains("text/html") {
            ContentKind::Html
        } else if media_type.contains("text/css") {
            ContentKind::Css
        } else {
            ContentKind::Passthrough
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Html => "html",
            ContentKind::Css => "css",
            ContentKind::Passthrough => "passthrough",
        }
    }
}

/// Content type for a body relayed without rewriting.
///
/// WebAssembly is forced to `application/wasm` (streaming compilation rejects
/// anything else); otherwise the declared type wins, then a guess from the
/// URL's file extension, then `application/octet-stream`.
pub fn passthrough_content_type(declared: Option<&str>, url: &Url) -> String {
    let declared = declared.map(str::trim).filter(|value| !value.is_empty());
    let path = url.path();

    if declared.is_some_and(|value| value.to_ascii_lowercase().contains(WASM))
        || path.to_ascii_lowercase().ends_with(".wasm")
    {
        return WASM.to_string();
    }

    if let Some(value) = declared {
        return value.to_string();
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// `charset` parameter of a content type, if any.
pub fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|value| !value.is_empty())
    })
}

/// Decode a text body to UTF-8 using the declared charset.
///
/// A byte order mark overrides the label. Unknown or missing labels decode
/// as UTF-8, replacing malformed sequences.
pub fn decode_text<'b>(body: &'b [u8], content_type: Option<&str>) -> Cow<'b, str> {
    let encoding = content_type
        .and_then(charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ContentKind::classify("text/html; charset=ISO-8859-1"), ContentKind::Html);
        assert_eq!(ContentKind::classify("TEXT/HTML"), ContentKind::Html);
        assert_eq!(ContentKind::classify("text/css"), ContentKind::Css);
        for other in [
            "application/javascript",
            "application/json",
            "image/png",
            "font/woff2",
            "video/mp4",
            "application/wasm",
            OCTET_STREAM,
            "",
            "something/unheard-of",
        ] {
            assert_eq!(ContentKind::classify(other), ContentKind::Passthrough, "{other}");
        }
    }

    #[test]
    fn test_declared_type_preserved() {
        assert_eq!(
            passthrough_content_type(Some("application/javascript; charset=utf-8"), &url("https://a.example/app")),
            "application/javascript; charset=utf-8"
        );
    }

    #[test]
    fn test_wasm_always_wins() {
        assert_eq!(passthrough_content_type(Some(OCTET_STREAM), &url("https://a.example/m.wasm")), WASM);
        assert_eq!(passthrough_content_type(None, &url("https://a.example/m.WASM?v=2")), WASM);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(passthrough_content_type(None, &url("https://a.example/f.woff2")), "font/woff2");
        assert_eq!(passthrough_content_type(Some("  "), &url("https://a.example/i.png")), "image/png");
        assert_eq!(passthrough_content_type(None, &url("https://a.example/blob")), OCTET_STREAM);
    }

    #[test]
    fn test_charset_parameter() {
        assert_eq!(charset("text/html; charset=ISO-8859-1"), Some("ISO-8859-1"));
        assert_eq!(charset("text/css;CHARSET=\"utf-8\""), Some("utf-8"));
        assert_eq!(charset("text/html"), None);
        assert_eq!(charset("text/html; charset="), None);
    }

    #[test]
    fn test_decode_text_uses_declared_charset() {
        assert_eq!(decode_text(b"caf\xe9", Some("text/html; charset=ISO-8859-1")), "caf\u{e9}");
        assert_eq!(decode_text(b"\x82\xa0", Some("text/html; charset=Shift_JIS")), "\u{3042}");
        assert_eq!(decode_text("caf\u{e9}".as_bytes(), Some("text/html")), "caf\u{e9}");
        assert_eq!(decode_text("caf\u{e9}".as_bytes(), Some("text/html; charset=no-such-charset")), "caf\u{e9}");
        assert_eq!(decode_text(b"\xef\xbb\xbfok", Some("text/css; charset=windows-1252")), "ok");
    }
}
