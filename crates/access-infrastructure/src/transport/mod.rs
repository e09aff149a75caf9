//! Transport module (HTTP exchange and credential renewal)

pub mod error;
pub mod backend;
pub mod authenticated;

pub use error::TransportError;
pub use backend::{HttpBackend, OutboundRequest, RawResponse, ReqwestBackend};
pub use authenticated::AuthenticatedTransport;
