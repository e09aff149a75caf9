//! Credential session context
//!
//! Holds the access/refresh credential pair of the logged-in operator.
//! Created on login with [`CredentialSession::init`] and cleared on logout
//! (or a failed refresh) with [`CredentialSession::teardown`]. Shared by
//! `Arc` with every component that talks to the remote store.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use access_shared::utils::mask_token;
use access_shared::UserId;

use crate::jwt::{Claims, JwtError};

struct Credentials {
    access: String,
    refresh: String,
    claims: Option<Claims>,
}

impl Credentials {
    fn new(access: String, refresh: String) -> Self {
        let claims = read_claims(&access);
        Self { access, refresh, claims }
    }
}

fn read_claims(access: &str) -> Option<Claims> {
    match Claims::inspect(access) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(token = %mask_token(access), error = %e, "Access token claims unavailable");
            None
        }
    }
}

#[derive(Default)]
pub struct CredentialSession {
    credentials: RwLock<Option<Credentials>>,
}

impl CredentialSession {
    /// Empty, logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, access: impl Into<String>, refresh: impl Into<String>) {
        let credentials = Credentials::new(access.into(), refresh.into());
        if let Some(claims) = &credentials.claims {
            if !claims.is_access_token() {
                warn!(token_type = ?claims.token_type, "Access credential is not an access token");
            }
            if let Err(JwtError::TokenExpired) = claims.ensure_not_expired(Utc::now()) {
                info!("Access credential already expired, first request will renew it");
            }
        }
        info!(
            user_id = ?credentials.claims.as_ref().and_then(Claims::subject_user_id),
            "Credential session initialised"
        );
        *self.credentials.write() = Some(credentials);
    }

    pub fn teardown(&self) {
        if self.credentials.write().take().is_some() {
            info!("Credential session torn down");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.read().is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.refresh.clone())
    }

    /// Replaces the access credential after a refresh. Returns false when
    /// the session was torn down in the meantime; nothing is stored then.
    pub fn store_access(&self, access: String) -> bool {
        let mut guard = self.credentials.write();
        match guard.as_mut() {
            Some(credentials) => {
                credentials.claims = read_claims(&access);
                credentials.access = access;
                true
            }
            None => false,
        }
    }

    /// Replaces the long-lived credential when the server rotates it.
    pub fn store_refresh(&self, refresh: String) -> bool {
        let mut guard = self.credentials.write();
        match guard.as_mut() {
            Some(credentials) => {
                credentials.refresh = refresh;
                true
            }
            None => false,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.claims.as_ref())
            .and_then(Claims::subject_user_id)
    }

    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.claims.as_ref())
            .and_then(Claims::expires_at)
    }
}
