// ============================================================================
// Access Infrastructure - Authenticated Transport
// File: crates/access-infrastructure/src/transport/authenticated.rs
// ============================================================================
//! Bearer-authenticated requests with single-flight credential renewal.
//!
//! A 401 triggers at most one refresh per expired credential no matter how
//! many requests hit it at once: renewals run under `refresh_gate`, and a
//! waiter that finds a different access credential than the one it was
//! rejected with reuses it instead of refreshing again. The original
//! request is retried once; there is no retry loop.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use std::sync::Arc;

use access_security::CredentialSession;
use access_shared::config::ApiSettings;
use access_shared::utils::mask_token;

use super::backend::{HttpBackend, OutboundRequest, RawResponse, ReqwestBackend};
use super::error::TransportError;

/// Body of a successful refresh call.
#[derive(Debug, Deserialize)]
struct RefreshGrant {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

pub struct AuthenticatedTransport<B: HttpBackend> {
    backend: B,
    session: Arc<CredentialSession>,
    refresh_path: String,
    refresh_gate: Mutex<()>,
}

impl AuthenticatedTransport<ReqwestBackend> {
    pub fn from_settings(
        settings: &ApiSettings,
        session: Arc<CredentialSession>,
    ) -> Result<Self, TransportError> {
        let backend = ReqwestBackend::new(settings)?;
        Ok(Self::new(backend, session, settings.refresh_path.clone()))
    }
}

impl<B: HttpBackend> AuthenticatedTransport<B> {
    pub fn new(backend: B, session: Arc<CredentialSession>, refresh_path: impl Into<String>) -> Self {
        Self {
            backend,
            session,
            refresh_path: refresh_path.into(),
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &Arc<CredentialSession> {
        &self.session
    }

    /// Performs one logical request and returns the success body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<String, TransportError> {
        let Some(token) = self.session.access_token() else {
            debug!(%method, path, "No access credential stored");
            return Err(TransportError::Unauthorized);
        };

        let response = self.dispatch(&method, path, &body, &token).await?;
        if response.status != 401 {
            return into_body(response);
        }

        debug!(%method, path, "Access credential rejected");
        let renewed = self.renew(&token).await?;

        let retry = self.dispatch(&method, path, &body, &renewed).await?;
        if retry.status == 401 {
            warn!(%method, path, "Request still unauthorized after renewal, tearing down credentials");
            self.session.teardown();
            return Err(TransportError::Unauthorized);
        }
        into_body(retry)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let body = self.request(Method::GET, path, None).await?;
        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }

    /// Sends `payload` as JSON. An empty success body yields `None`.
    pub async fn send_json<P, T>(
        &self,
        method: Method,
        path: &str,
        payload: &P,
    ) -> Result<Option<T>, TransportError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(payload)
            .map_err(|e| TransportError::MalformedResponse(format!("unserializable request: {}", e)))?;
        let response = self.request(method, path, Some(body)).await?;
        if response.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&response)
            .map(Some)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: &Option<Value>,
        token: &str,
    ) -> Result<RawResponse, TransportError> {
        self.backend
            .send(OutboundRequest {
                method: method.clone(),
                path: path.to_string(),
                body: body.clone(),
                bearer: Some(token.to_string()),
            })
            .await
    }

    /// Returns an access credential newer than `stale`, refreshing only if
    /// nobody else already did.
    async fn renew(&self, stale: &str) -> Result<String, TransportError> {
        let _gate = self.refresh_gate.lock().await;

        match self.session.access_token() {
            None => {
                debug!("Credentials torn down while waiting for renewal");
                return Err(TransportError::Unauthorized);
            }
            Some(current) if current != stale => {
                debug!(token = %mask_token(&current), "Reusing credential renewed by a concurrent request");
                return Ok(current);
            }
            Some(_) => {}
        }

        let Some(refresh) = self.session.refresh_token() else {
            return Err(TransportError::Unauthorized);
        };

        info!(path = %self.refresh_path, "Refreshing access credential");
        match self.call_refresh(&refresh).await {
            Ok(grant) => {
                if !self.session.store_access(grant.access.clone()) {
                    debug!("Credentials torn down during refresh, dropping new credential");
                    return Err(TransportError::Unauthorized);
                }
                if let Some(rotated) = grant.refresh {
                    self.session.store_refresh(rotated);
                }
                info!(token = %mask_token(&grant.access), "Access credential refreshed");
                Ok(grant.access)
            }
            Err(e) => {
                warn!(error = %e, "Credential refresh failed, tearing down credentials");
                self.session.teardown();
                Err(TransportError::Unauthorized)
            }
        }
    }

    async fn call_refresh(&self, refresh: &str) -> Result<RefreshGrant, TransportError> {
        let response = self
            .backend
            .send(OutboundRequest {
                method: Method::POST,
                path: self.refresh_path.clone(),
                body: Some(json!({ "refresh": refresh })),
                bearer: None,
            })
            .await?;
        let body = into_body(response)?;
        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}

fn into_body(response: RawResponse) -> Result<String, TransportError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(TransportError::from_status(response.status, response.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const REFRESH_PATH: &str = "/api/token/refresh/";

    #[derive(Clone, Copy)]
    enum RefreshReply {
        Grant { rotate: bool },
        Reject,
        Malformed,
    }

    /// Accepts exactly one access credential and counts every call.
    struct FakeServer {
        accepted: std::sync::Mutex<String>,
        refresh_reply: RefreshReply,
        data_status: Option<u16>,
        reject_everything: bool,
        refresh_calls: AtomicUsize,
        data_calls: AtomicUsize,
    }

    impl FakeServer {
        fn new(accepted: &str, refresh_reply: RefreshReply) -> Self {
            Self {
                accepted: std::sync::Mutex::new(accepted.to_string()),
                refresh_reply,
                data_status: None,
                reject_everything: false,
                refresh_calls: AtomicUsize::new(0),
                data_calls: AtomicUsize::new(0),
            }
        }

        fn refresh_calls(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }

        fn data_calls(&self) -> usize {
            self.data_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpBackend for FakeServer {
        async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
            if request.path == REFRESH_PATH {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                assert!(request.bearer.is_none());
                tokio::time::sleep(Duration::from_millis(10)).await;
                let response = match self.refresh_reply {
                    RefreshReply::Grant { rotate } => {
                        *self.accepted.lock().unwrap() = "fresh".to_string();
                        let body = if rotate {
                            json!({ "access": "fresh", "refresh": "refresh-2" })
                        } else {
                            json!({ "access": "fresh" })
                        };
                        RawResponse { status: 200, body: body.to_string() }
                    }
                    RefreshReply::Reject => RawResponse {
                        status: 401,
                        body: r#"{"detail":"Token is invalid or expired"}"#.to_string(),
                    },
                    RefreshReply::Malformed => RawResponse {
                        status: 200,
                        body: "{}".to_string(),
                    },
                };
                return Ok(response);
            }

            self.data_calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if let Some(status) = self.data_status {
                return Ok(RawResponse { status, body: "upstream failure".to_string() });
            }
            let accepted = self.accepted.lock().unwrap().clone();
            if self.reject_everything || request.bearer.as_deref() != Some(accepted.as_str()) {
                return Ok(RawResponse { status: 401, body: String::new() });
            }
            Ok(RawResponse {
                status: 200,
                body: json!({ "path": request.path }).to_string(),
            })
        }
    }

    fn transport(server: FakeServer, access: &str) -> AuthenticatedTransport<FakeServer> {
        let session = Arc::new(CredentialSession::new());
        session.init(access, "refresh-1");
        AuthenticatedTransport::new(server, session, REFRESH_PATH)
    }

    #[tokio::test]
    async fn test_valid_credential_needs_no_refresh() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Grant { rotate: false }), "fresh");

        let body: Value = transport.get_json("/api/menus/").await.unwrap();
        assert_eq!(body["path"], "/api/menus/");
        assert_eq!(transport.backend().refresh_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_expiry_refreshes_once() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Grant { rotate: false }), "stale");

        let (catalog, assignment, other) = tokio::join!(
            transport.get_json::<Value>("/api/menus/"),
            transport.get_json::<Value>("/api/users/7/menus/"),
            transport.get_json::<Value>("/api/users/8/menus/"),
        );

        assert_eq!(catalog.unwrap()["path"], "/api/menus/");
        assert_eq!(assignment.unwrap()["path"], "/api/users/7/menus/");
        assert_eq!(other.unwrap()["path"], "/api/users/8/menus/");
        assert_eq!(transport.backend().refresh_calls(), 1);
        assert_eq!(transport.session().access_token().as_deref(), Some("fresh"));
        // Three rejected attempts plus three retries.
        assert_eq!(transport.backend().data_calls(), 6);
    }

    #[tokio::test]
    async fn test_rotated_refresh_credential_is_stored() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Grant { rotate: true }), "stale");

        transport.get_json::<Value>("/api/menus/").await.unwrap();
        assert_eq!(transport.session().refresh_token().as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn test_failed_refresh_tears_down_credentials() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Reject), "stale");

        let (first, second) = tokio::join!(
            transport.get_json::<Value>("/api/menus/"),
            transport.get_json::<Value>("/api/users/7/menus/"),
        );

        assert_eq!(first.unwrap_err(), TransportError::Unauthorized);
        assert_eq!(second.unwrap_err(), TransportError::Unauthorized);
        assert_eq!(transport.backend().refresh_calls(), 1);
        // No retry after a failed refresh.
        assert_eq!(transport.backend().data_calls(), 2);
        assert!(!transport.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_malformed_refresh_counts_as_failure() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Malformed), "stale");

        let err = transport.get_json::<Value>("/api/menus/").await.unwrap_err();
        assert_eq!(err, TransportError::Unauthorized);
        assert!(!transport.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_retry_rejected_again_does_not_loop() {
        let mut server = FakeServer::new("fresh", RefreshReply::Grant { rotate: false });
        server.reject_everything = true;
        let transport = transport(server, "stale");

        let err = transport.get_json::<Value>("/api/menus/").await.unwrap_err();
        assert_eq!(err, TransportError::Unauthorized);
        assert_eq!(transport.backend().refresh_calls(), 1);
        assert_eq!(transport.backend().data_calls(), 2);
    }

    #[tokio::test]
    async fn test_other_failures_pass_through() {
        let mut server = FakeServer::new("fresh", RefreshReply::Grant { rotate: false });
        server.data_status = Some(503);
        let transport = transport(server, "fresh");

        let err = transport.get_json::<Value>("/api/menus/").await.unwrap_err();
        assert_eq!(
            err,
            TransportError::Server {
                status: 503,
                body: "upstream failure".to_string(),
            }
        );
        assert_eq!(transport.backend().refresh_calls(), 0);
        assert_eq!(transport.backend().data_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_skips_network() {
        let server = FakeServer::new("fresh", RefreshReply::Grant { rotate: false });
        let transport = AuthenticatedTransport::new(server, Arc::new(CredentialSession::new()), REFRESH_PATH);

        let err = transport.get_json::<Value>("/api/menus/").await.unwrap_err();
        assert_eq!(err, TransportError::Unauthorized);
        assert_eq!(transport.backend().data_calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_body_is_malformed() {
        let transport = transport(FakeServer::new("fresh", RefreshReply::Grant { rotate: false }), "fresh");

        let err = transport.get_json::<Vec<i64>>("/api/menus/").await.unwrap_err();
        assert!(matches!(err, TransportError::MalformedResponse(_)));
    }
}
