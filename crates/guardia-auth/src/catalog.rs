//! The permission catalog.
//!
//! A read-only table of every permission the application knows about.
//! Role permission lists are validated against it, and the evaluator
//! refuses to answer for identifiers it does not contain.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::permission::{
    OwnerField, PermissionDef, PermissionScope, is_valid_permission_name,
};

/// The ownership-scoped permission of the built-in catalog.
pub const VIEW_OWN_PERMISSION: &str = "net:view_own";

const BUILTIN_PERMISSIONS: &[(&str, &str, PermissionScope)] = &[
    ("user:view", "View user accounts", PermissionScope::Global),
    ("user:create", "Create user accounts", PermissionScope::Global),
    ("user:edit", "Edit user accounts", PermissionScope::Global),
    ("user:delete", "Delete user accounts", PermissionScope::Global),
    ("role:view", "View roles and their permissions", PermissionScope::Global),
    ("role:manage", "Create, edit and delete roles", PermissionScope::Global),
    ("net:view", "View all network records", PermissionScope::Global),
    (
        VIEW_OWN_PERMISSION,
        "View network records you own",
        PermissionScope::Owner(OwnerField::Username),
    ),
    ("net:create", "Create network records", PermissionScope::Global),
    ("net:edit", "Edit network records", PermissionScope::Global),
    ("net:delete", "Delete network records", PermissionScope::Global),
    ("net:import", "Import network records from files", PermissionScope::Global),
    ("net:export", "Export network records to spreadsheets", PermissionScope::Global),
    ("report:view", "View reports and dashboards", PermissionScope::Global),
    ("report:export", "Export reports", PermissionScope::Global),
    ("audit:view", "View the audit log", PermissionScope::Global),
    ("settings:manage", "Change application settings", PermissionScope::Global),
];

static BUILTIN: LazyLock<PermissionCatalog> = LazyLock::new(|| PermissionCatalog {
    entries: BUILTIN_PERMISSIONS
        .iter()
        .map(|(name, description, scope)| {
            (
                (*name).to_owned(),
                PermissionDef {
                    name: (*name).to_owned(),
                    description: (*description).to_owned(),
                    scope: *scope,
                },
            )
        })
        .collect(),
});

#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    entries: BTreeMap<String, PermissionDef>,
}

impl PermissionCatalog {
    /// Build a catalog, rejecting malformed or duplicate identifiers.
    pub fn new(defs: impl IntoIterator<Item = PermissionDef>) -> GuardiaResult<Self> {
        let mut entries = BTreeMap::new();
        for def in defs {
            if !is_valid_permission_name(&def.name) {
                return Err(GuardiaError::Validation {
                    message: format!(
                        "permission identifier {:?} is not of the form resource:action",
                        def.name
                    ),
                });
            }
            if entries.contains_key(&def.name) {
                return Err(GuardiaError::Validation {
                    message: format!("permission {:?} is defined twice", def.name),
                });
            }
            entries.insert(def.name.clone(), def);
        }
        Ok(Self { entries })
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The process-wide catalog shipped with the application.
    pub fn builtin() -> &'static PermissionCatalog {
        &BUILTIN
    }

    pub fn get(&self, name: &str) -> Option<&PermissionDef> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|def| def.description.as_str())
    }

    /// Identifiers in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionDef> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    defs: Vec<PermissionDef>,
}

impl CatalogBuilder {
    pub fn permission(self, name: &str, description: &str) -> Self {
        self.with_scope(name, description, PermissionScope::Global)
    }

    pub fn owned(self, name: &str, description: &str, field: OwnerField) -> Self {
        self.with_scope(name, description, PermissionScope::Owner(field))
    }

    pub fn with_scope(mut self, name: &str, description: &str, scope: PermissionScope) -> Self {
        self.defs.push(PermissionDef {
            name: name.to_owned(),
            description: description.to_owned(),
            scope,
        });
        self
    }

    pub fn build(self) -> GuardiaResult<PermissionCatalog> {
        PermissionCatalog::new(self.defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_identifiers_are_well_formed() {
        let catalog = PermissionCatalog::builtin();
        assert_eq!(catalog.len(), BUILTIN_PERMISSIONS.len());
        for name in catalog.names() {
            assert!(is_valid_permission_name(name), "bad identifier {name}");
        }
    }

    #[test]
    fn builtin_has_exactly_one_ownership_scoped_permission() {
        let scoped: Vec<_> = PermissionCatalog::builtin()
            .iter()
            .filter(|def| def.scope.is_ownership_scoped())
            .map(|def| def.name.as_str())
            .collect();
        assert_eq!(scoped, vec![VIEW_OWN_PERMISSION]);
    }

    #[test]
    fn builder_rejects_malformed_identifier() {
        let err = PermissionCatalog::builder()
            .permission("net:view", "ok")
            .permission("not:a:real:permission", "bad")
            .build()
            .unwrap_err();
        assert!(matches!(err, GuardiaError::Validation { .. }));
    }

    #[test]
    fn builder_rejects_duplicates() {
        let err = PermissionCatalog::builder()
            .permission("net:view", "one")
            .permission("net:view", "two")
            .build()
            .unwrap_err();
        assert!(matches!(err, GuardiaError::Validation { .. }));
    }

    #[test]
    fn lookups() {
        let catalog = PermissionCatalog::builder()
            .permission("net:view", "View")
            .owned("net:view_own", "View own", OwnerField::UserId)
            .build()
            .unwrap();

        assert!(catalog.contains("net:view"));
        assert!(!catalog.contains("net:delete"));
        assert_eq!(catalog.description("net:view"), Some("View"));
        assert_eq!(
            catalog.get("net:view_own").map(|d| d.scope),
            Some(PermissionScope::Owner(OwnerField::UserId))
        );
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["net:view", "net:view_own"]
        );
    }
}
