//! URL resolution and proxied-reference encoding.
//!
//! # Responsibilities
//! - Turn any reference found in markup into an absolute URL
//! - Encode absolute URLs as references to the proxy endpoint
//! - Leave references that must not be proxied untouched
//!
//! # Resolution order (first match wins)
//! 1. empty, `data:`, `blob:`, `javascript:` and fragment-only → unchanged
//! 2. already contains the proxy prefix → unchanged
//! 3. absolute `http(s)://` → unchanged if it targets the proxy's own host,
//!    otherwise wrapped
//! 4. protocol-relative `//host/path` → promoted to `https:` and wrapped
//! 5. root-relative `/path` → joined to the target origin and wrapped
//! 6. anything else → joined to the resolution base and wrapped
//!
//! The injected runtime patch (`runtime_patch.js`) implements the same order
//! in the browser; keep the two in step.
//!
//! # Design Decisions
//! - Never fails: a reference that cannot be parsed is returned unchanged
//! - Resolved URLs with a scheme other than http/https are left unchanged
//! - Encoding is RFC 3986 unreserved-only, so wrapping is deterministic

use std::borrow::Cow;

use url::Url;

/// Prefix of every proxied reference, e.g. `/proxy?url=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPrefix {
    prefix: String,
    query_param: String,
}

impl ProxyPrefix {
    /// Build the prefix from the endpoint path and query parameter.
    pub fn new(path: &str, query_param: &str) -> Self {
        Self {
            prefix: format!("{path}?{query_param}="),
            query_param: query_param.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Name of the query parameter carrying the target URL.
    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    /// Encode an absolute URL as a proxied reference.
    pub fn wrap(&self, absolute: &Url) -> String {
        format!("{}{}", self.prefix, urlencoding::encode(absolute.as_str()))
    }

    /// True when the reference already points at the proxy endpoint.
    pub fn is_proxied(&self, reference: &str) -> bool {
        reference.contains(self.prefix.as_str())
    }
}

impl Default for ProxyPrefix {
    fn default() -> Self {
        Self::new("/proxy", "url")
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reference is kept exactly as written.
    Passthrough,
    /// The reference was resolved and wrapped.
    Proxied {
        /// Absolute form of the reference.
        absolute: Url,
        /// Proxied reference to write back into the content.
        href: String,
    },
}

impl Resolution {
    pub fn is_proxied(&self) -> bool {
        matches!(self, Resolution::Proxied { .. })
    }
}

/// Resolves references against one document.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    base: &'a Url,
    prefix: &'a ProxyPrefix,
    proxy_host: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    ///
    /// `base` is the document's target URL (relative references resolve against
    /// it, root-relative ones against its origin). `proxy_host` is the
    /// `host[:port]` the proxy itself is served from, when known.
    pub fn new(base: &'a Url, prefix: &'a ProxyPrefix, proxy_host: Option<&'a str>) -> Self {
        Self {
            base,
            prefix,
            proxy_host,
        }
    }

    /// Resolve a reference.
    pub fn resolve(&self, reference: &str) -> Resolution {
        let trimmed = reference.trim();

        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || has_scheme(trimmed, "data:")
            || has_scheme(trimmed, "blob:")
            || has_scheme(trimmed, "javascript:")
        {
            return Resolution::Passthrough;
        }

        if self.prefix.is_proxied(trimmed) {
            return Resolution::Passthrough;
        }

        let absolute = if has_scheme(trimmed, "http://") || has_scheme(trimmed, "https://") {
            match Url::parse(trimmed) {
                Ok(url) if self.is_proxy_host(&url) => return Resolution::Passthrough,
                Ok(url) => url,
                Err(_) => return Resolution::Passthrough,
            }
        } else if trimmed.starts_with("//") {
            match Url::parse(&format!("https:{trimmed}")) {
                Ok(url) => url,
                Err(_) => return Resolution::Passthrough,
            }
        } else {
            // Root-relative and relative references share the join; a leading
            // '/' discards the base path and keeps only its origin.
            match self.base.join(trimmed) {
                Ok(url) => url,
                Err(_) => return Resolution::Passthrough,
            }
        };

        if !matches!(absolute.scheme(), "http" | "https") {
            return Resolution::Passthrough;
        }

        let href = self.prefix.wrap(&absolute);
        Resolution::Proxied { absolute, href }
    }

    /// Rewrite a reference, borrowing it when it is left unchanged.
    pub fn rewrite<'r>(&self, reference: &'r str) -> Cow<'r, str> {
        match self.resolve(reference) {
            Resolution::Proxied { href, .. } => Cow::Owned(href),
            Resolution::Passthrough => Cow::Borrowed(reference),
        }
    }

    fn is_proxy_host(&self, url: &Url) -> bool {
        let Some(proxy_host) = self.proxy_host else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        authority.eq_ignore_ascii_case(proxy_host)
    }
}

fn has_scheme(reference: &str, scheme: &str) -> bool {
    reference
        .get(..scheme.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
}
