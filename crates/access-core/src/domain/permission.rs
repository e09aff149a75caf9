// ============================================================================
// Access Core - Permission Set
// File: crates/access-core/src/domain/permission.rs
// Description: Working/baseline menu id sets with cascading toggles
// ============================================================================
//! Per-session permission state.
//!
//! Invariant after every mutating call: each id in the working set has its
//! whole ancestor chain in the working set. `load_baseline` is the one
//! entry point that does not enforce it; fetched sets are taken as given.

use std::collections::BTreeSet;

use access_shared::MenuId;

use crate::domain::catalog::MenuCatalog;
use crate::error::AccessError;

/// Direction a toggle went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Enabled,
    Disabled,
}

/// Pending changes of the working set relative to the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDiff {
    pub granted: BTreeSet<MenuId>,
    pub revoked: BTreeSet<MenuId>,
}

impl PermissionDiff {
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty() && self.revoked.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    working: BTreeSet<MenuId>,
    baseline: BTreeSet<MenuId>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds both sets from a fetched assignment.
    pub fn load_baseline<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = MenuId>,
    {
        self.baseline = ids.into_iter().collect();
        self.working = self.baseline.clone();
    }

    /// Disables `id` and everything below it when enabled; otherwise
    /// enables `id` and its ancestor chain.
    ///
    /// Disabling discards descendants, so toggling the same node twice does
    /// not bring them back.
    pub fn toggle(&mut self, catalog: &MenuCatalog, id: MenuId) -> Result<ToggleOutcome, AccessError> {
        if self.working.contains(&id) {
            let below = catalog.descendants(id)?;
            self.working.remove(&id);
            self.working.retain(|granted| !below.contains(granted));
            Ok(ToggleOutcome::Disabled)
        } else {
            let above = catalog.ancestor_chain(id)?;
            self.working.insert(id);
            self.working.extend(above);
            Ok(ToggleOutcome::Enabled)
        }
    }

    pub fn select_all(&mut self, catalog: &MenuCatalog) {
        self.working = catalog.flatten().into_iter().collect();
    }

    pub fn deselect_all(&mut self) {
        self.working.clear();
    }

    pub fn reset_to_baseline(&mut self) {
        self.working = self.baseline.clone();
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Call only once the remote store confirmed the working set.
    pub fn commit(&mut self) {
        self.baseline = self.working.clone();
    }

    pub fn diff(&self) -> PermissionDiff {
        PermissionDiff {
            granted: self.working.difference(&self.baseline).copied().collect(),
            revoked: self.baseline.difference(&self.working).copied().collect(),
        }
    }

    pub fn working(&self) -> &BTreeSet<MenuId> {
        &self.working
    }

    pub fn baseline(&self) -> &BTreeSet<MenuId> {
        &self.baseline
    }

    pub fn contains(&self, id: MenuId) -> bool {
        self.working.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::tests::sample_catalog;

    fn ids(values: &[MenuId]) -> BTreeSet<MenuId> {
        values.iter().copied().collect()
    }

    fn assert_closed_under_ancestors(catalog: &MenuCatalog, set: &PermissionSet) {
        for &id in set.working() {
            for ancestor in catalog.ancestor_chain(id).unwrap() {
                assert!(
                    set.contains(ancestor),
                    "{} granted without ancestor {} in {:?}",
                    id,
                    ancestor,
                    set.working()
                );
            }
        }
    }

    #[test]
    fn test_cascade_disable_discards_descendants() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();

        assert_eq!(set.toggle(&catalog, 3).unwrap(), ToggleOutcome::Enabled);
        assert_eq!(set.working(), &ids(&[1, 2, 3]));

        assert_eq!(set.toggle(&catalog, 2).unwrap(), ToggleOutcome::Disabled);
        assert_eq!(set.working(), &ids(&[1]));

        assert_eq!(set.toggle(&catalog, 2).unwrap(), ToggleOutcome::Enabled);
        assert_eq!(set.working(), &ids(&[1, 2]));
    }

    #[test]
    fn test_disable_leaves_siblings_alone() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();
        set.load_baseline([1, 2, 3, 4]);

        set.toggle(&catalog, 2).unwrap();
        assert_eq!(set.working(), &ids(&[1, 4]));
    }

    #[test]
    fn test_cascade_enable() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();
        set.load_baseline([1]);

        set.toggle(&catalog, 4).unwrap();
        assert_eq!(set.working(), &ids(&[1, 4]));

        set.toggle(&catalog, 6).unwrap();
        assert_eq!(set.working(), &ids(&[1, 4, 5, 6]));
    }

    #[test]
    fn test_unknown_id_leaves_set_untouched() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();
        set.load_baseline([1, 2]);

        assert_eq!(set.toggle(&catalog, 99), Err(AccessError::NotFound(99)));
        assert_eq!(set.working(), &ids(&[1, 2]));
        assert!(!set.is_dirty());
    }

    #[test]
    fn test_invariant_holds_for_every_toggle_sequence() {
        let catalog = sample_catalog();
        let all = catalog.flatten();

        // Every sequence of four toggles over the six nodes.
        let total = all.len().pow(4);
        for mut code in 0..total {
            let mut set = PermissionSet::new();
            for _ in 0..4 {
                let id = all[code % all.len()];
                code /= all.len();
                set.toggle(&catalog, id).unwrap();
                assert_closed_under_ancestors(&catalog, &set);
            }
        }
    }

    #[test]
    fn test_bulk_operations() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();

        set.select_all(&catalog);
        assert_eq!(set.working(), &catalog.flatten().into_iter().collect::<BTreeSet<_>>());
        assert_closed_under_ancestors(&catalog, &set);

        set.deselect_all();
        assert!(set.working().is_empty());
    }

    #[test]
    fn test_dirty_tracking() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();
        set.load_baseline([1, 2]);
        assert!(!set.is_dirty());

        set.toggle(&catalog, 4).unwrap();
        assert!(set.is_dirty());
        assert_eq!(
            set.diff(),
            PermissionDiff {
                granted: ids(&[4]),
                revoked: BTreeSet::new(),
            }
        );

        set.reset_to_baseline();
        assert!(!set.is_dirty());
        assert!(set.diff().is_empty());

        set.toggle(&catalog, 2).unwrap();
        set.toggle(&catalog, 4).unwrap();
        assert_eq!(set.diff().revoked, ids(&[2]));
        set.commit();
        assert!(!set.is_dirty());
        assert_eq!(set.baseline(), &ids(&[1, 4]));
    }

    #[test]
    fn test_membership_neutral_edit_is_not_dirty() {
        let catalog = sample_catalog();
        let mut set = PermissionSet::new();
        set.load_baseline([1, 4]);

        set.toggle(&catalog, 4).unwrap();
        set.toggle(&catalog, 4).unwrap();
        assert!(!set.is_dirty());

        set.select_all(&catalog);
        set.reset_to_baseline();
        assert!(!set.is_dirty());
    }
}
