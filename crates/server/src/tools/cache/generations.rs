//! cache_generations tool implementation.

use intercache_client::{LifecycleState, ServiceHost};
use intercache_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// The generation this build reads and writes.
    pub current: String,
    /// Host lifecycle state: "uninitialized", "installing" or "active".
    pub state: String,
    /// Every generation still in the store.
    pub generations: Vec<String>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(host: &ServiceHost) -> Result<CallToolResult, McpError> {
    let versions = host.versions();
    let state = match host.state().await {
        LifecycleState::Uninitialized => "uninitialized",
        LifecycleState::Installing => "installing",
        LifecycleState::Active => "active",
    };

    let output = CacheGenerationsOutput {
        current: versions.current().to_string(),
        state: state.to_string(),
        generations: versions.generations().await?,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize generations: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_host, output};
    use intercache_core::CacheDb;

    #[tokio::test]
    async fn test_generations_after_activation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.ensure_generation("app-v1").await.unwrap();

        let host = active_host(&db, &[]).await;
        let out: CacheGenerationsOutput = output(&generations_impl(&host).await.unwrap());

        assert_eq!(out.current, "app-v2");
        assert_eq!(out.state, "active");
        assert_eq!(out.generations, vec!["app-v2".to_string()]);
    }
}
