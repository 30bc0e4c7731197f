//! Client-side runtime patch.
//!
//! The patch is a fixed script template (`runtime_patch.js`) with a single
//! placeholder for its per-document parameters. It intercepts fetch,
//! `XMLHttpRequest.open`, element creation, anchor clicks, navigation and
//! dynamically inserted elements, routing every URL through the same
//! resolution rules as the server-side rewriter.

use serde::Serialize;

use crate::rewrite::context::RewriteContext;

const TEMPLATE: &str = include_str!("runtime_patch.js");
const CONFIG_PLACEHOLDER: &str = "__PROXY_RUNTIME_CONFIG__";

/// Attribute marking the injected script tag.
pub const RUNTIME_MARKER: &str = "data-proxy-runtime";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeParams<'a> {
    prefix: &'a str,
    param: &'a str,
    target_origin: String,
    base_url: &'a str,
    request_url: &'a str,
}

/// JavaScript source of the patch for one document.
pub fn runtime_source(ctx: &RewriteContext) -> String {
    let params = RuntimeParams {
        prefix: ctx.prefix().as_str(),
        param: ctx.prefix().query_param(),
        target_origin: ctx.origin(),
        base_url: ctx.target().as_str(),
        request_url: ctx.request_url(),
    };

    // Serializing a struct of strings cannot fail; an empty object keeps the
    // script syntactically valid regardless.
    let json = serde_json::to_string(&params).unwrap_or_else(|_| "{}".to_string());

    TEMPLATE.replacen(CONFIG_PLACEHOLDER, &escape_for_script(&json), 1)
}

/// The patch wrapped in a `<script>` element, ready for injection.
pub fn runtime_script(ctx: &RewriteContext) -> String {
    format!("<script {RUNTIME_MARKER}>{}</script>", runtime_source(ctx))
}

// `\u003c` decodes to `<` inside a JS string literal, so no value can close
// the script element or open a comment.
fn escape_for_script(json: &str) -> String {
    json.replace('<', "\\u003c")
}
