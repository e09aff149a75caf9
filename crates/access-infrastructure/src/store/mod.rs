//! Store module (AccessStore adapters)

pub mod http_access_store;

pub use http_access_store::HttpAccessStore;
