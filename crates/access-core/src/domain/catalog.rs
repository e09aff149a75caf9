// ============================================================================
// Access Core - Menu Catalog
// File: crates/access-core/src/domain/catalog.rs
// Description: Read-only menu forest with ancestor/descendant queries
// ============================================================================
//! Arena representation of the menu forest.
//!
//! Entries are stored in pre-order, so the descendants of an entry are the
//! contiguous range `index + 1 .. subtree_end`. Parent and children links
//! are indices into the same arena.

use std::collections::{BTreeSet, HashMap};

use access_shared::MenuId;

use crate::domain::menu::{is_navigable_path, FlatMenuRow, MenuNode};
use crate::error::AccessError;

/// One node of a built catalog.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub id: MenuId,
    pub name: String,
    pub path: String,
    pub icon: Option<String>,
    pub parent_id: Option<MenuId>,
    pub depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    subtree_end: usize,
}

impl MenuEntry {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_navigable(&self) -> bool {
        is_navigable_path(&self.path)
    }
}

/// Result of checking an id set against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogAudit {
    /// Ids the catalog does not know.
    pub unknown: BTreeSet<MenuId>,
    /// Known ids with at least one ancestor missing from the set.
    pub orphaned: BTreeSet<MenuId>,
}

impl CatalogAudit {
    pub fn is_clean(&self) -> bool {
        self.unknown.is_empty() && self.orphaned.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    entries: Vec<MenuEntry>,
    index: HashMap<MenuId, usize>,
    roots: Vec<usize>,
}

/// Work item while laying out the arena: a node still to be placed, the
/// arena index of its parent and its depth.
struct Pending<T> {
    item: T,
    parent: Option<usize>,
    depth: usize,
}

impl MenuCatalog {
    /// Builds the catalog from the nested shape of the catalog endpoint.
    pub fn build(nodes: Vec<MenuNode>) -> Result<Self, AccessError> {
        let mut catalog = Self::default();
        let mut stack: Vec<Pending<MenuNode>> = nodes
            .into_iter()
            .rev()
            .map(|item| Pending { item, parent: None, depth: 0 })
            .collect();

        while let Some(Pending { item, parent, depth }) = stack.pop() {
            let MenuNode { id, name, path, icon, children } = item;
            let idx = catalog.place(id, name, path, icon, parent, depth)?;
            stack.extend(children.into_iter().rev().map(|child| Pending {
                item: child,
                parent: Some(idx),
                depth: depth + 1,
            }));
        }

        catalog.seal();
        Ok(catalog)
    }

    /// Builds the catalog from parent-pointer rows. Children keep row order.
    pub fn from_flat(rows: Vec<FlatMenuRow>) -> Result<Self, AccessError> {
        let mut known = BTreeSet::new();
        for row in &rows {
            if !known.insert(row.id) {
                return Err(AccessError::MalformedCatalog(format!(
                    "menu id {} appears more than once",
                    row.id
                )));
            }
        }

        let mut children_of: HashMap<Option<MenuId>, Vec<usize>> = HashMap::new();
        for (position, row) in rows.iter().enumerate() {
            if let Some(parent_id) = row.parent_id {
                if !known.contains(&parent_id) {
                    return Err(AccessError::MalformedCatalog(format!(
                        "menu {} references missing parent {}",
                        row.id, parent_id
                    )));
                }
            }
            children_of.entry(row.parent_id).or_default().push(position);
        }

        let mut catalog = Self::default();
        let mut stack: Vec<Pending<usize>> = children_of
            .get(&None)
            .map(|roots| {
                roots
                    .iter()
                    .rev()
                    .map(|&item| Pending { item, parent: None, depth: 0 })
                    .collect()
            })
            .unwrap_or_default();

        while let Some(Pending { item, parent, depth }) = stack.pop() {
            let row = &rows[item];
            let idx = catalog.place(
                row.id,
                row.name.clone(),
                row.path.clone(),
                row.icon.clone(),
                parent,
                depth,
            )?;
            if let Some(children) = children_of.get(&Some(row.id)) {
                stack.extend(children.iter().rev().map(|&child| Pending {
                    item: child,
                    parent: Some(idx),
                    depth: depth + 1,
                }));
            }
        }

        // Rows never reached from a root sit on a parent cycle.
        if catalog.entries.len() != rows.len() {
            let cyclic: Vec<MenuId> = rows
                .iter()
                .map(|row| row.id)
                .filter(|id| !catalog.index.contains_key(id))
                .collect();
            return Err(AccessError::MalformedCatalog(format!(
                "menus {:?} form a parent cycle",
                cyclic
            )));
        }

        catalog.seal();
        Ok(catalog)
    }

    fn place(
        &mut self,
        id: MenuId,
        name: String,
        path: String,
        icon: Option<String>,
        parent: Option<usize>,
        depth: usize,
    ) -> Result<usize, AccessError> {
        if self.index.contains_key(&id) {
            return Err(AccessError::MalformedCatalog(format!(
                "menu id {} appears more than once",
                id
            )));
        }

        let idx = self.entries.len();
        let parent_id = parent.map(|p| self.entries[p].id);
        self.entries.push(MenuEntry {
            id,
            name,
            path,
            icon,
            parent_id,
            depth,
            parent,
            children: Vec::new(),
            subtree_end: idx + 1,
        });
        self.index.insert(id, idx);

        match parent {
            Some(p) => self.entries[p].children.push(idx),
            None => self.roots.push(idx),
        }
        Ok(idx)
    }

    /// Computes subtree ranges once every entry is placed in pre-order.
    fn seal(&mut self) {
        for idx in (0..self.entries.len()).rev() {
            let end = match self.entries[idx].children.last() {
                Some(&last) => self.entries[last].subtree_end,
                None => idx + 1,
            };
            self.entries[idx].subtree_end = end;
        }
    }

    fn position(&self, id: MenuId) -> Result<usize, AccessError> {
        self.index.get(&id).copied().ok_or(AccessError::NotFound(id))
    }

    pub fn lookup(&self, id: MenuId) -> Result<&MenuEntry, AccessError> {
        self.position(id).map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, id: MenuId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestor_chain(&self, id: MenuId) -> Result<Vec<MenuId>, AccessError> {
        let idx = self.position(id)?;
        let mut chain = Vec::with_capacity(self.entries[idx].depth);
        let mut cursor = self.entries[idx].parent;
        while let Some(idx) = cursor {
            chain.push(self.entries[idx].id);
            cursor = self.entries[idx].parent;
        }
        Ok(chain)
    }

    /// Every id strictly below `id`.
    pub fn descendants(&self, id: MenuId) -> Result<BTreeSet<MenuId>, AccessError> {
        let idx = self.position(id)?;
        let end = self.entries[idx].subtree_end;
        Ok(self.entries[idx + 1..end].iter().map(|e| e.id).collect())
    }

    /// All ids in pre-order.
    pub fn flatten(&self) -> Vec<MenuId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &MenuEntry> + '_ {
        self.roots.iter().map(move |&idx| &self.entries[idx])
    }

    pub fn children(&self, id: MenuId) -> Result<Vec<&MenuEntry>, AccessError> {
        let idx = self.position(id)?;
        Ok(self.entries[idx]
            .children
            .iter()
            .map(|&child| &self.entries[child])
            .collect())
    }

    /// Reports ids of `ids` that are unknown or whose ancestor chain is
    /// not fully contained in `ids`.
    pub fn audit(&self, ids: &BTreeSet<MenuId>) -> CatalogAudit {
        let mut audit = CatalogAudit::default();
        for &id in ids {
            match self.index.get(&id) {
                None => {
                    audit.unknown.insert(id);
                }
                Some(&idx) => {
                    let mut cursor = self.entries[idx].parent;
                    while let Some(parent) = cursor {
                        if !ids.contains(&self.entries[parent].id) {
                            audit.orphaned.insert(id);
                            break;
                        }
                        cursor = self.entries[parent].parent;
                    }
                }
            }
        }
        audit
    }

    /// The full forest back in its nested shape.
    pub fn to_nodes(&self) -> Vec<MenuNode> {
        self.roots
            .iter()
            .filter_map(|&idx| self.assemble(idx, &|_| true))
            .collect()
    }

    /// The forest as the navigation shell should render it for `granted`:
    /// a node appears only when it and all of its ancestors are granted.
    pub fn visible_tree(&self, granted: &BTreeSet<MenuId>) -> Vec<MenuNode> {
        self.roots
            .iter()
            .filter_map(|&idx| self.assemble(idx, &|id| granted.contains(&id)))
            .collect()
    }

    fn assemble(&self, idx: usize, keep: &dyn Fn(MenuId) -> bool) -> Option<MenuNode> {
        let entry = &self.entries[idx];
        if !keep(entry.id) {
            return None;
        }
        Some(MenuNode {
            id: entry.id,
            name: entry.name.clone(),
            path: entry.path.clone(),
            icon: entry.icon.clone(),
            children: entry
                .children
                .iter()
                .filter_map(|&child| self.assemble(child, keep))
                .collect(),
        })
    }
}
