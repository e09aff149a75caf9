//! Expand/collapse state of a menu tree view.
//!
//! Disposable presentation state keyed by node id. It never reads from or
//! writes to a `PermissionSet`.

use std::collections::BTreeSet;

use access_shared::MenuId;

use crate::domain::catalog::MenuCatalog;

#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: BTreeSet<MenuId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: MenuId) -> bool {
        self.expanded.contains(&id)
    }

    /// Returns whether the node is expanded afterwards.
    pub fn toggle(&mut self, id: MenuId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
            return true;
        }
        false
    }

    pub fn expand(&mut self, id: MenuId) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: MenuId) {
        self.expanded.remove(&id);
    }

    /// Expands every node that has children.
    pub fn expand_all(&mut self, catalog: &MenuCatalog) {
        self.expanded = catalog
            .flatten()
            .into_iter()
            .filter(|&id| catalog.lookup(id).map(|e| !e.is_leaf()).unwrap_or(false))
            .collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Drops ids that vanished after a catalog refetch.
    pub fn retain_known(&mut self, catalog: &MenuCatalog) {
        self.expanded.retain(|&id| catalog.contains(id));
    }
}
