//! Remote menu access store (port)

use async_trait::async_trait;

use access_shared::UserId;

use crate::domain::{Assignment, MenuNode};
use crate::error::AccessError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Nested menu catalog of the application.
    async fn fetch_catalog(&self) -> Result<Vec<MenuNode>, AccessError>;

    async fn fetch_assignment(&self, user_id: UserId) -> Result<Assignment, AccessError>;

    /// Returns the persisted set when the store echoes it back.
    async fn persist_assignment(
        &self,
        user_id: UserId,
        assignment: &Assignment,
    ) -> Result<Option<Assignment>, AccessError>;
}
