//! cache_get tool implementation.
//!
//! Reads a stored entry from the current generation. Never touches the network.

use intercache_client::{ExpectedDigest, InterceptRequest, ServiceHost};
use intercache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The URL whose stored entry to retrieve.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub generation: String,
    pub key: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub stored_at: String,
    pub bytes: usize,
    /// SHA-384 digest of the stored payload.
    pub digest: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(host: &ServiceHost, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let key = InterceptRequest::parse(&params.method, &params.url)?.key();
    let orchestrator = host
        .orchestrator()
        .await
        .ok_or_else(|| Error::Lifecycle("cache is not active".to_string()))?;

    let store = orchestrator.store();
    let entry = store
        .get(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        generation: store.generation().to_string(),
        key: key.to_string(),
        status: entry.status,
        content_type: entry.content_type,
        stored_at: entry.stored_at,
        bytes: entry.body.len(),
        digest: ExpectedDigest::of(&entry.body).to_string(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
