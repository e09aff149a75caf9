//! # Access Core - Domain Module
//! 
//! Menu tree, permission sets, and the wire shapes that populate them.

pub mod menu;
pub mod catalog;
pub mod permission;
pub mod assignment;
pub mod view_state;

pub use menu::{FlatMenuRow, MenuNode};
pub use catalog::{CatalogAudit, MenuCatalog, MenuEntry};
pub use permission::{PermissionDiff, PermissionSet, ToggleOutcome};
pub use assignment::{Assignment, FlaggedGrant, MenuPermissions};
pub use view_state::ExpansionState;
