//! Navigation menu read from a JSON descriptor at startup.
//!
//! The descriptor is `{ "menu": [ ... ] }` where each item has a `route`,
//! `name`, `type` (`link`, `sub`, `extLink`, `extTabLink`), `icon`, optional
//! `children` and optional `permissions { only, except }`.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use talent_core::auth::{Permission, RoleRegistry};

#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("cannot read menu file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid menu file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuItemKind {
    Link,
    Sub,
    ExtLink,
    ExtTabLink,
}

/// `only` / `except` lists; each entry names a role or a permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuPermissions {
    #[serde(default, deserialize_with = "one_or_many")]
    pub only: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub except: Vec<String>,
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![one],
        OneOrMany::Many(many) => many,
    })
}

impl MenuPermissions {
    fn grants(registry: &RoleRegistry, name: &str) -> bool {
        registry.has_role(name)
            || Permission::from_name(name).is_some_and(|p| registry.has_permission(p))
    }

    /// Visible when `only` is empty or any entry is granted, and no `except`
    /// entry is granted.
    #[must_use]
    pub fn allows(&self, registry: &RoleRegistry) -> bool {
        let only = self.only.is_empty() || self.only.iter().any(|n| Self::grants(registry, n));
        let except = self.except.iter().any(|n| Self::grants(registry, n));
        only && !except
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MenuItem {
    pub route: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MenuItemKind,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub children: Vec<MenuItem>,
    #[serde(default)]
    pub permissions: Option<MenuPermissions>,
}

#[derive(Deserialize)]
struct MenuFile {
    menu: Vec<MenuItem>,
}

/// A menu entry resolved for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub name: String,
    pub icon: String,
    pub href: String,
    pub external: bool,
    pub new_tab: bool,
    pub children: Vec<MenuEntry>,
}

impl MenuEntry {
    /// Whether `path` is this entry or below it.
    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        !self.external
            && (path == self.href
                || path
                    .strip_prefix(self.href.as_str())
                    .is_some_and(|rest| rest.starts_with('/')))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Menu {
    items: Vec<MenuItem>,
}

impl Menu {
    /// Parse a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not have the menu shape.
    pub fn from_json(json: &str) -> Result<Self, MenuError> {
        let file: MenuFile = serde_json::from_str(json)?;
        Ok(Self { items: file.menu })
    }

    /// Read the descriptor at `path`. A failure is logged and yields an
    /// empty menu.
    pub fn load(path: &Path) -> Self {
        let result = std::fs::read_to_string(path)
            .map_err(MenuError::from)
            .and_then(|json| Self::from_json(&json));
        match result {
            Ok(menu) => {
                tracing::info!(path = %path.display(), items = menu.items.len(), "Menu loaded");
                menu
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error loading menu");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Entries the registry may see, with hrefs resolved.
    #[must_use]
    pub fn visible_for(&self, registry: &RoleRegistry) -> Vec<MenuEntry> {
        resolve(&self.items, "", registry)
    }
}

fn resolve(items: &[MenuItem], parent: &str, registry: &RoleRegistry) -> Vec<MenuEntry> {
    items
        .iter()
        .filter(|item| item.permissions.as_ref().is_none_or(|p| p.allows(registry)))
        .filter_map(|item| {
            let external = matches!(item.kind, MenuItemKind::ExtLink | MenuItemKind::ExtTabLink);
            let href = if external {
                item.route.clone()
            } else {
                format!("{parent}/{}", item.route.trim_matches('/'))
            };
            let children = resolve(&item.children, &href, registry);
            if item.kind == MenuItemKind::Sub && children.is_empty() {
                return None;
            }
            Some(MenuEntry {
                name: item.name.clone(),
                icon: item.icon.clone(),
                href,
                external,
                new_tab: item.kind == MenuItemKind::ExtTabLink,
                children,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MENU: &str = r#"{
      "menu": [
        { "route": "dashboard", "name": "Dashboard", "type": "link", "icon": "dashboard" },
        { "route": "employees", "name": "Employees", "type": "link", "icon": "people" },
        {
          "route": "admin", "name": "Administration", "type": "sub", "icon": "settings",
          "children": [
            { "route": "positions", "name": "Positions", "type": "link",
              "permissions": { "only": "HRAdmin" } },
            { "route": "salary-ranges", "name": "Salary Ranges", "type": "link",
              "permissions": { "only": ["HRAdmin"] } }
          ]
        },
        { "route": "/help", "name": "Help", "type": "extTabLink", "icon": "help",
          "permissions": { "except": ["Guest"] } },
        { "route": "reports", "name": "Reports", "type": "link",
          "permissions": { "only": ["canEdit"] } }
      ]
    }"#;

    fn names(entries: &[MenuEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_hr_admin_sees_everything() {
        let menu = Menu::from_json(MENU).unwrap();
        let entries = menu.visible_for(&RoleRegistry::from_claims(true, &["HRAdmin"]));
        assert_eq!(
            names(&entries),
            vec!["Dashboard", "Employees", "Administration", "Help", "Reports"]
        );
        assert_eq!(entries[2].children[1].href, "/admin/salary-ranges");
        assert!(entries[3].new_tab);
        assert_eq!(entries[3].href, "/help");
    }

    #[test]
    fn test_guest_filtering() {
        let menu = Menu::from_json(MENU).unwrap();
        let entries = menu.visible_for(&RoleRegistry::guest());
        assert_eq!(names(&entries), vec!["Dashboard", "Employees"]);
    }

    #[test]
    fn test_permission_names_match() {
        let menu = Menu::from_json(MENU).unwrap();
        let entries = menu.visible_for(&RoleRegistry::from_claims(true, &["Manager"]));
        assert_eq!(names(&entries), vec!["Dashboard", "Employees", "Help", "Reports"]);
    }

    #[test]
    fn test_missing_file_gives_empty_menu() {
        let menu = Menu::load(Path::new("/nonexistent/menu.json"));
        assert!(menu.items().is_empty());
    }

    #[test]
    fn test_active_entry() {
        let menu = Menu::from_json(MENU).unwrap();
        let entries = menu.visible_for(&RoleRegistry::guest());
        assert!(entries[1].is_active("/employees/edit/1"));
        assert!(!entries[1].is_active("/employeesx"));
    }
}
