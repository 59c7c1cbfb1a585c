//! cache_fetch tool implementation.
//!
//! Sends one request through the interception host, exactly as an intercepted
//! page request would travel.

use intercache_client::{Destination, ExpectedDigest, InterceptRequest, ServiceHost};
use intercache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// The absolute http(s) URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET is ever cached.
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a page navigation.
    #[serde(default)]
    pub navigate: bool,

    /// Request destination: "script", "worker", "document", "image", ...
    #[serde(default)]
    pub destination: Option<String>,

    /// Request body, forwarded untouched on bypassed requests.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Output from the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    /// The URL as it was routed.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Whether the status was 2xx.
    pub ok: bool,
    /// Content-Type of the response, if any.
    pub content_type: Option<String>,
    /// "network" or "cache".
    pub source: String,
    /// Routing policy the request resolved to; absent before activation.
    pub policy: Option<String>,
    /// Payload length in bytes.
    pub bytes: usize,
    /// SHA-384 digest of the payload in `sha384-<hex>` form.
    pub digest: String,
    /// Payload as text, when it is valid UTF-8.
    pub body: Option<String>,
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(host: &ServiceHost, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    let mut request = InterceptRequest::parse(&params.method, &params.url)?;
    if params.navigate {
        request = request.navigation();
    }
    if let Some(destination) = params.destination.as_deref() {
        request = request.with_destination(destination.parse::<Destination>().unwrap_or_default());
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let policy = host
        .orchestrator()
        .await
        .map(|orchestrator| orchestrator.resolver().resolve(&request).to_string());

    tracing::debug!(url = %request.url(), policy = ?policy, "cache_fetch");
    let response = host.on_intercept(&request).await?;

    let ok = response.ok();
    let bytes = response.payload.into_bytes();
    let output = CacheFetchOutput {
        url: request.url().to_string(),
        status: response.status,
        ok,
        content_type: response.content_type,
        source: response.source.as_str().to_string(),
        policy,
        bytes: bytes.len(),
        digest: ExpectedDigest::of(&bytes).to_string(),
        body: std::str::from_utf8(&bytes).ok().map(str::to_string),
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_host, output};
    use intercache_core::CacheDb;

    const PAGE: &str = "https://app.example/data.json";

    fn params(url: &str) -> CacheFetchParams {
        CacheFetchParams { url: url.to_string(), method: default_method(), navigate: false, destination: None, body: None }
    }

    #[tokio::test]
    async fn test_fetch_then_serve_from_cache() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = active_host(&db, &[(PAGE, 200, "{\"ok\":true}")]).await;

        let first: CacheFetchOutput = output(&fetch_impl(&host, params(PAGE)).await.unwrap());
        assert_eq!(first.source, "network");
        assert_eq!(first.policy.as_deref(), Some("network_first"));
        assert_eq!(first.body.as_deref(), Some("{\"ok\":true}"));
        assert!(first.digest.starts_with("sha384-"));

        host.settle().await;

        let second: CacheFetchOutput = output(&fetch_impl(&host, params(PAGE)).await.unwrap());
        assert_eq!(second.source, "cache");
        assert_eq!(second.digest, first.digest);
    }

    #[tokio::test]
    async fn test_fetch_foreign_origin_bypasses() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = active_host(&db, &[("https://cdn.other/lib.js", 200, "lib")]).await;

        let mut p = params("https://cdn.other/lib.js");
        p.destination = Some("script".to_string());
        let out: CacheFetchOutput = output(&fetch_impl(&host, p).await.unwrap());

        assert_eq!(out.policy.as_deref(), Some("bypass"));
        host.settle().await;
        assert_eq!(db.count_entries("app-v2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_script_policy() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = active_host(&db, &[("https://app.example/app.js", 200, "main()")]).await;

        let mut p = params("https://app.example/app.js");
        p.destination = Some("script".to_string());
        let out: CacheFetchOutput = output(&fetch_impl(&host, p).await.unwrap());

        assert_eq!(out.policy.as_deref(), Some("cache_first"));
        assert!(out.ok);
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = active_host(&db, &[]).await;

        assert!(fetch_impl(&host, params("not a url")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_offline_miss_is_error() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = active_host(&db, &[]).await;

        assert!(fetch_impl(&host, params(PAGE)).await.is_err());
    }
}
