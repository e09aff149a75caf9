//! Plain-text rendering of menu trees for the terminal.

use std::collections::BTreeSet;

use access_core::{AccessError, ExpansionState, MenuCatalog, MenuEntry, MenuNode, PermissionDiff};
use access_shared::MenuId;

const INDENT: &str = "  ";

/// Catalog tree honouring `expansion`. With `granted`, every line gets a
/// checkbox.
pub fn render_catalog(
    catalog: &MenuCatalog,
    expansion: &ExpansionState,
    granted: Option<&BTreeSet<MenuId>>,
) -> Result<String, AccessError> {
    let mut out = String::new();
    for root in catalog.roots() {
        render_entry(catalog, root, expansion, granted, &mut out)?;
    }
    Ok(out)
}

fn render_entry(
    catalog: &MenuCatalog,
    entry: &MenuEntry,
    expansion: &ExpansionState,
    granted: Option<&BTreeSet<MenuId>>,
    out: &mut String,
) -> Result<(), AccessError> {
    let marker = if entry.is_leaf() {
        "•"
    } else if expansion.is_expanded(entry.id) {
        "▾"
    } else {
        "▸"
    };
    let check = match granted {
        Some(set) if set.contains(&entry.id) => "[x] ",
        Some(_) => "[ ] ",
        None => "",
    };
    out.push_str(&format!(
        "{}{} {}{} #{}",
        INDENT.repeat(entry.depth),
        marker,
        check,
        entry.name,
        entry.id
    ));
    if entry.is_navigable() {
        out.push_str(&format!("  {}", entry.path));
    }
    out.push('\n');

    if !entry.is_leaf() && expansion.is_expanded(entry.id) {
        for child in catalog.children(entry.id)? {
            render_entry(catalog, child, expansion, granted, out)?;
        }
    }
    Ok(())
}

/// Navigation tree as a user would see it.
pub fn render_navigation(nodes: &[MenuNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, 0, &mut out);
    }
    out
}

fn render_node(node: &MenuNode, depth: usize, out: &mut String) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(&node.name);
    if node.is_navigable() {
        out.push_str(&format!(" -> {}", node.path));
    }
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

pub fn render_diff(diff: &PermissionDiff) -> String {
    if diff.is_empty() {
        return "no changes".to_string();
    }
    let join = |ids: &BTreeSet<MenuId>| {
        ids.iter().map(|id| format!("#{}", id)).collect::<Vec<_>>().join(", ")
    };
    let mut parts = Vec::new();
    if !diff.granted.is_empty() {
        parts.push(format!("granted {}", join(&diff.granted)));
    }
    if !diff.revoked.is_empty() {
        parts.push(format!("revoked {}", join(&diff.revoked)));
    }
    parts.join("; ")
}
