//! Access errors

use thiserror::Error;

use access_shared::MenuId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    #[error("Menu not found: {0}")]
    NotFound(MenuId),

    #[error("Unauthorized: credentials could not be renewed")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No editing session is open")]
    SessionClosed,

    #[error("Editing session was closed or replaced before the request completed")]
    StaleSession,

    #[error("A save is already in flight for this session")]
    SaveInProgress,
}

impl AccessError {
    /// Only an unrenewable credential forces logout; everything else can be
    /// retried or shown to the operator.
    pub fn requires_login(&self) -> bool {
        matches!(self, AccessError::Unauthorized)
    }
}
