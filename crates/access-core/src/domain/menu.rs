// ============================================================================
// Access Core - Menu Node
// File: crates/access-core/src/domain/menu.rs
// Description: Wire shapes of the menu catalog
// ============================================================================

use serde::{Deserialize, Deserializer, Serialize};

use access_shared::constants::NON_NAVIGABLE_PATH;
use access_shared::MenuId;

/// Nested catalog node as returned by the catalog endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: MenuId,
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub children: Vec<MenuNode>,
}

/// Parent-pointer row, the shape menus are stored in server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatMenuRow {
    pub id: MenuId,

    #[serde(default)]
    pub parent_id: Option<MenuId>,

    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub path: String,

    #[serde(default)]
    pub icon: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Grouping nodes carry the sentinel path (or none at all).
pub fn is_navigable_path(path: &str) -> bool {
    let path = path.trim();
    !path.is_empty() && path != NON_NAVIGABLE_PATH
}

impl MenuNode {
    pub fn new(id: MenuId, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            path: path.into().trim().to_string(),
            icon: None,
            children: Vec::new(),
        }
    }

    /// Grouping node without a navigation target.
    pub fn group(id: MenuId, name: impl Into<String>) -> Self {
        Self::new(id, name, NON_NAVIGABLE_PATH)
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_navigable(&self) -> bool {
        is_navigable_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_nested_catalog() {
        let json = r##"[
            {"id": 1, "name": "HR", "path": "#", "icon": "users", "children": [
                {"id": 2, "name": "Employees", "path": "/employees", "icon": null}
            ]},
            {"id": 3, "name": "Dashboard", "path": null}
        ]"##;

        let nodes: Vec<MenuNode> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(!nodes[0].is_navigable());
        assert_eq!(nodes[0].children[0].path, "/employees");
        assert!(nodes[0].children[0].is_navigable());
        assert!(nodes[0].children[0].children.is_empty());
        assert_eq!(nodes[1].path, "");
        assert!(!nodes[1].is_navigable());
    }

    #[test]
    fn test_builder_helpers() {
        let node = MenuNode::group(1, " Settings ")
            .with_icon("gear")
            .with_children(vec![MenuNode::new(2, "Users", "/users")]);
        assert_eq!(node.name, "Settings");
        assert_eq!(node.icon.as_deref(), Some("gear"));
        assert!(!node.is_navigable());
        assert!(node.children[0].is_navigable());
    }
}
