//! Per-response rewrite context.

use url::Url;

use crate::config::EndpointConfig;
use crate::rewrite::resolver::{ProxyPrefix, Resolver};

/// Everything needed to rewrite one upstream response.
///
/// Built per request and dropped with the response; never shared.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// Location of the fetched document (after redirects).
    target: Url,
    /// Target URL exactly as the client requested it.
    request_url: String,
    prefix: ProxyPrefix,
    proxy_host: Option<String>,
    inject_runtime: bool,
}

impl RewriteContext {
    pub fn new(target: Url, request_url: impl Into<String>, prefix: ProxyPrefix) -> Self {
        Self {
            target,
            request_url: request_url.into(),
            prefix,
            proxy_host: None,
            inject_runtime: true,
        }
    }

    /// Context for a response served under the given endpoint.
    ///
    /// `inbound_host` is the Host header of the client request; a configured
    /// public host takes precedence over it.
    pub fn for_endpoint(
        endpoint: &EndpointConfig,
        target: Url,
        request_url: impl Into<String>,
        inbound_host: Option<&str>,
    ) -> Self {
        let proxy_host = endpoint.public_host().or(inbound_host).map(str::to_string);
        Self::new(
            target,
            request_url,
            ProxyPrefix::new(&endpoint.path, &endpoint.query_param),
        )
        .with_proxy_host(proxy_host)
    }

    pub fn with_proxy_host(mut self, proxy_host: Option<String>) -> Self {
        self.proxy_host = proxy_host;
        self
    }

    pub fn with_runtime(mut self, inject_runtime: bool) -> Self {
        self.inject_runtime = inject_runtime;
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// ASCII serialization of the target origin, e.g. `https://example.com`.
    pub fn origin(&self) -> String {
        self.target.origin().ascii_serialization()
    }

    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    pub fn prefix(&self) -> &ProxyPrefix {
        &self.prefix
    }

    pub fn inject_runtime(&self) -> bool {
        self.inject_runtime
    }

    /// Resolver bound to this document.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.target, &self.prefix, self.proxy_host.as_deref())
    }
}
