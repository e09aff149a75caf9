// ============================================================================
// Access Infrastructure - HTTP Backend
// File: crates/access-infrastructure/src/transport/backend.rs
// ============================================================================
//! Raw HTTP exchange. Statuses are returned as data; only failures to get
//! a response at all are errors here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use access_shared::config::ApiSettings;

use super::error::TransportError;

#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Relative to the backend's base URL.
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError>;
}

/// Production backend on a shared `reqwest` client.
pub struct ReqwestBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestBackend {
    pub fn new(settings: &ApiSettings) -> Result<Self, TransportError> {
        let timeout = settings.request_timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(method = %request.method, %url, status, "HTTP exchange completed");

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let settings = ApiSettings {
            base_url: "http://access.local:8000/".to_string(),
            ..ApiSettings::default()
        };
        let backend = ReqwestBackend::new(&settings).unwrap();
        assert_eq!(backend.url("/api/menus/"), "http://access.local:8000/api/menus/");
        assert_eq!(backend.url("api/menus/"), "http://access.local:8000/api/menus/");
    }
}
