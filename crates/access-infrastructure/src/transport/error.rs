use std::time::Duration;

use thiserror::Error;

use access_core::AccessError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rejected by remote store ({status}): {body}")]
    Validation { status: u16, body: String },

    #[error("Remote store error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Maps a non-success status to its error. 2xx is not an error and
    /// must be handled by the caller.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => TransportError::Unauthorized,
            400 | 422 => TransportError::Validation { status, body },
            _ => TransportError::Server { status, body },
        }
    }
}

impl From<TransportError> for AccessError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => AccessError::Unauthorized,
            TransportError::Validation { body, .. } => AccessError::ValidationError(body),
            TransportError::Server { status, body } => AccessError::ServerError {
                status,
                message: body,
            },
            TransportError::Network(message) => AccessError::NetworkError(message),
            TransportError::Timeout(after) => {
                AccessError::NetworkError(format!("request timed out after {:?}", after))
            }
            TransportError::MalformedResponse(message) => AccessError::MalformedResponse(message),
        }
    }
}
