//! # Access Infrastructure
//! 
//! HTTP adapters: the credential-renewing transport and the remote
//! menu access store built on it.

pub mod transport;
pub mod store;

pub use transport::{AuthenticatedTransport, HttpBackend, ReqwestBackend, TransportError};
pub use store::HttpAccessStore;
