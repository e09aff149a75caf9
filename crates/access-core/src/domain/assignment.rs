// ============================================================================
// Access Core - Menu Assignment
// File: crates/access-core/src/domain/assignment.rs
// Description: Per-user menu grants as exchanged with the remote store
// ============================================================================

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use access_shared::MenuId;

use crate::error::AccessError;

/// Set-membership grant of one user, the canonical permission shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assignment {
    pub menu_ids: Vec<MenuId>,
}

impl Assignment {
    /// Sorted and deduplicated.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = MenuId>,
    {
        let set: BTreeSet<MenuId> = ids.into_iter().collect();
        Self {
            menu_ids: set.into_iter().collect(),
        }
    }

    pub fn id_set(&self) -> BTreeSet<MenuId> {
        self.menu_ids.iter().copied().collect()
    }

    /// Migrates per-menu flag rows into the set model. A row grants its
    /// menu when `is_view` is set; rows with no flags are skipped; rows
    /// with action flags but no view flag cannot be expressed and are
    /// rejected.
    pub fn from_flagged(rows: &[FlaggedGrant]) -> Result<Self, AccessError> {
        let mut granted = BTreeSet::new();
        for row in rows {
            let perms = &row.permissions;
            if perms.is_view {
                granted.insert(row.menu_id);
            } else if perms.has_any_permission() {
                return Err(AccessError::ValidationError(format!(
                    "menu {} grants actions without view access",
                    row.menu_id
                )));
            }
        }
        Ok(Self::from_ids(granted))
    }
}

/// Menu permission flags
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuPermissions {
    #[serde(default)]
    pub is_view: bool,
    #[serde(default)]
    pub is_add: bool,
    #[serde(default)]
    pub is_edit: bool,
    #[serde(default)]
    pub is_delete: bool,
}

impl MenuPermissions {
    #[cfg(test)]
    pub fn full_access() -> Self {
        Self {
            is_view: true,
            is_add: true,
            is_edit: true,
            is_delete: true,
        }
    }

    #[cfg(test)]
    pub fn read_only() -> Self {
        Self {
            is_view: true,
            ..Self::default()
        }
    }

    pub fn has_any_permission(&self) -> bool {
        self.is_view || self.is_add || self.is_edit || self.is_delete
    }
}

/// Row of the flag-shaped permission model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedGrant {
    pub menu_id: MenuId,
    #[serde(flatten)]
    pub permissions: MenuPermissions,
}

impl FlaggedGrant {
    pub fn new(menu_id: MenuId, permissions: MenuPermissions) -> Self {
        Self { menu_id, permissions }
    }
}
