//! intercache server entry point.
//!
//! Boots the interception host (install, then activate) and serves it over MCP
//! on stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use intercache_client::{FetchClient, FetchConfig, ServiceHost};
use intercache_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db = %config.db_path.display(), generation = %config.generation_id(), "starting intercache");

    let db = CacheDb::open(&config.db_path).await?;
    let transport = FetchClient::new(FetchConfig::from(&config))?;
    let host = Arc::new(ServiceHost::new(config, Arc::new(db), Arc::new(transport)));

    host.on_install().await?;
    host.on_activate().await?;

    let handler = handler::IntercacheServer::new(Arc::clone(&host));
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    host.settle().await;

    Ok(())
}
