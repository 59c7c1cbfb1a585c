//! Host fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use intercache_client::{InterceptRequest, Payload, Response, ServiceHost, Transport};
use intercache_core::{AppConfig, CacheDb, Error};

/// Serves a fixed table of bodies; anything else is a network failure.
pub(crate) struct StaticTransport {
    routes: HashMap<String, (u16, &'static str)>,
}

impl StaticTransport {
    pub(crate) fn new(routes: &[(&str, u16, &'static str)]) -> Self {
        let routes = routes
            .iter()
            .map(|(url, status, body)| (url.to_string(), (*status, *body)))
            .collect();
        Self { routes }
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, request: &InterceptRequest) -> Result<Response, Error> {
        match self.routes.get(request.url().as_str()) {
            Some((status, body)) => Ok(Response::from_network(
                *status,
                Some("text/plain".to_string()),
                Payload::new(body.as_bytes().to_vec()),
            )),
            None => Err(Error::NetworkFailure(format!("no route to {}", request.url()))),
        }
    }
}

pub(crate) fn config() -> AppConfig {
    AppConfig {
        cache_prefix: "app-".into(),
        cache_version: "v2".into(),
        own_origin: Some("https://app.example".into()),
        ..Default::default()
    }
}

/// An installed and activated host over an in-memory store.
pub(crate) async fn active_host(db: &CacheDb, routes: &[(&str, u16, &'static str)]) -> Arc<ServiceHost> {
    let host = Arc::new(ServiceHost::new(config(), Arc::new(db.clone()), Arc::new(StaticTransport::new(routes))));
    host.on_install().await.unwrap();
    host.on_activate().await.unwrap();
    host
}

/// Decode the JSON text block of a successful tool result.
pub(crate) fn output<T: serde::de::DeserializeOwned>(result: &rmcp::model::CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
