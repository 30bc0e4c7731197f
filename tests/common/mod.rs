//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::extract::Path;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;

use rewrite_proxy::config::ProxyConfig;
use rewrite_proxy::http::HttpServer;
use rewrite_proxy::lifecycle::Shutdown;

pub const PAGE_HTML: &str = r##"<!DOCTYPE html>
<html>
<head>
<meta http-equiv="Content-Security-Policy" content="default-src 'self'">
<link rel="stylesheet" href="/style.css" integrity="sha384-deadbeef">
<link rel="manifest" href="manifest.json">
</head>
<body>
<a href="/x">root relative</a>
<a href="#top">fragment</a>
<img src="y.png">
<script src="//cdn.example/lib.js"></script>
<a href="http://{PROXY}/elsewhere">own host</a>
</body>
</html>"##;

pub const STYLE_CSS: &str = "body{background:url(/bg.png)}\n@import 'theme.css';\n";

pub const SCRIPT_JS: &str = "fetch('/api/data').then(r => r.json());";

/// Start a mock origin on an ephemeral port.
///
/// `{PROXY}` in the page body is replaced with `proxy_host`, so pages can
/// link back to the proxy itself.
pub async fn start_mock_upstream(proxy_host: Option<SocketAddr>) -> SocketAddr {
    let page = PAGE_HTML.replace(
        "{PROXY}",
        &proxy_host.map(|a| a.to_string()).unwrap_or_else(|| "127.0.0.1:1".into()),
    );

    let app = Router::new()
        .route(
            "/page",
            get(move || {
                let page = page.clone();
                async move {
                    (
                        [
                            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                            (header::CONTENT_SECURITY_POLICY, "default-src 'none'"),
                            (header::X_FRAME_OPTIONS, "DENY"),
                            (header::CACHE_CONTROL, "max-age=60"),
                        ],
                        page,
                    )
                }
            }),
        )
        .route(
            "/style.css",
            get(|| async { ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS) }),
        )
        .route(
            "/app.js",
            get(|| async { ([(header::CONTENT_TYPE, "application/javascript")], SCRIPT_JS) }),
        )
        .route(
            "/module.wasm",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/octet-stream")],
                    Bytes::from_static(b"\0asm\x01\0\0\0"),
                )
            }),
        )
        .route("/logo.png", get(|| async { untyped(&b"\x89PNG\r\n\x1a\n"[..]) }))
        .route(
            "/missing",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><head></head><body><a href=\"/home\">home</a></body></html>",
                )
            }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        )
        .route("/moved", get(|| async { Redirect::temporary("/docs/final.html") }))
        .route(
            "/docs/final.html",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    "<html><head></head><body><img src=\"pic.png\"></body></html>",
                )
            }),
        )
        .route("/loop/{hops}", get(redirect_chain))
        .route("/echo", any(echo));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn untyped(body: &'static [u8]) -> Response {
    Response::new(Body::from(body))
}

/// `/loop/n` redirects `n` times before answering.
async fn redirect_chain(Path(hops): Path<u32>) -> Response {
    match hops {
        0 => ([(header::CONTENT_TYPE, "text/plain")], "end of chain").into_response(),
        n => Redirect::temporary(&format!("/loop/{}", n - 1)).into_response(),
    }
}

/// Echo method, content type, range and body back as JSON.
async fn echo(method: axum::http::Method, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    axum::Json(serde_json::json!({
        "method": method.as_str(),
        "content_type": header_text(header::CONTENT_TYPE),
        "range": header_text(header::RANGE),
        "cookie": header_text(header::COOKIE),
        "user_agent": header_text(header::USER_AGENT),
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Bind an ephemeral port for the proxy without starting it yet.
pub async fn bind_proxy() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Run the proxy on `listener`. Keep the returned [`Shutdown`] alive for the
/// duration of the test.
pub fn spawn_proxy(config: ProxyConfig, listener: TcpListener) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    shutdown
}

/// Start the proxy with `config` on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let (listener, addr) = bind_proxy().await;
    (addr, spawn_proxy(config, listener))
}

/// Proxy URL for `target`.
pub fn proxied(proxy: SocketAddr, target: &str) -> String {
    format!("http://{proxy}/proxy?url={}", urlencoding::encode(target))
}

/// Client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
