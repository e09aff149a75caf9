//! Common types

use uuid::Uuid;

/// Identifier of a node in the menu catalog.
pub type MenuId = i64;

/// Identifier of a console user whose menu access is being edited.
pub type UserId = i64;

/// Correlation id of one editing session.
pub type SessionId = Uuid;

pub fn new_session_id() -> SessionId {
    Uuid::new_v4()
}
