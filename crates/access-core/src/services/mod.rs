//! Domain services

pub mod sync_coordinator;

pub use sync_coordinator::{SaveOutcome, SessionPhase, SessionSnapshot, SyncCoordinator};
