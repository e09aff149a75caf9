//! # Access Core
//! 
//! Menu catalog, permission set, the remote store port, and the
//! coordinator that drives one permission editing session.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod error;

// Re-export domain entities
pub use domain::*;
pub use error::AccessError;
pub use repositories::AccessStore;
pub use services::{SaveOutcome, SessionPhase, SessionSnapshot, SyncCoordinator};
