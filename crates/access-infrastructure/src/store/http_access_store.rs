// ============================================================================
// Access Infrastructure - HTTP Access Store
// File: crates/access-infrastructure/src/store/http_access_store.rs
// ============================================================================

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use access_core::domain::{Assignment, FlaggedGrant, MenuNode};
use access_core::error::AccessError;
use access_core::repositories::AccessStore;
use access_shared::config::ApiSettings;
use access_shared::UserId;

use crate::transport::{AuthenticatedTransport, HttpBackend, ReqwestBackend};

/// Assignment bodies come either as a plain id set or as per-menu flag rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssignmentPayload {
    Ids(Assignment),
    Flagged(Vec<FlaggedGrant>),
}

impl AssignmentPayload {
    fn into_assignment(self) -> Result<Assignment, AccessError> {
        match self {
            AssignmentPayload::Ids(assignment) => Ok(Assignment::from_ids(assignment.menu_ids)),
            AssignmentPayload::Flagged(rows) => {
                debug!(rows = rows.len(), "Migrating flag-shaped assignment");
                Assignment::from_flagged(&rows)
            }
        }
    }
}

pub struct HttpAccessStore<B: HttpBackend = ReqwestBackend> {
    transport: AuthenticatedTransport<B>,
    settings: ApiSettings,
}

impl<B: HttpBackend> HttpAccessStore<B> {
    pub fn new(transport: AuthenticatedTransport<B>, settings: ApiSettings) -> Self {
        Self { transport, settings }
    }

    pub fn transport(&self) -> &AuthenticatedTransport<B> {
        &self.transport
    }
}

#[async_trait]
impl<B: HttpBackend> AccessStore for HttpAccessStore<B> {
    async fn fetch_catalog(&self) -> Result<Vec<MenuNode>, AccessError> {
        let nodes: Vec<MenuNode> = self.transport.get_json(&self.settings.catalog_path).await?;
        debug!(roots = nodes.len(), "Menu catalog fetched");
        Ok(nodes)
    }

    async fn fetch_assignment(&self, user_id: UserId) -> Result<Assignment, AccessError> {
        let path = self.settings.assignment_path_for(user_id);
        let payload: AssignmentPayload = self.transport.get_json(&path).await?;
        let assignment = payload.into_assignment()?;
        debug!(user_id, granted = assignment.menu_ids.len(), "Assignment fetched");
        Ok(assignment)
    }

    async fn persist_assignment(
        &self,
        user_id: UserId,
        assignment: &Assignment,
    ) -> Result<Option<Assignment>, AccessError> {
        let path = self.settings.assignment_path_for(user_id);
        let reply: Option<Value> = self
            .transport
            .send_json(Method::PUT, &path, assignment)
            .await?;

        // Anything that is not an id set is a plain confirmation.
        let echoed = reply.and_then(|body| serde_json::from_value::<Assignment>(body).ok());
        info!(user_id, echoed = echoed.is_some(), "Assignment persisted");
        Ok(echoed)
    }
}
