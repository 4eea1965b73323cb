//! Built-in role provisioning.
//!
//! Run once at startup. Creates missing built-in roles and reconciles the
//! permission sets of existing system roles with the catalog. Roles that
//! exist but are not flagged as system roles are left alone. A second run
//! against the same catalog performs no writes.

use std::collections::BTreeSet;
use std::sync::Arc;

use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::role::{CreateRole, Role, UpdateRole};
use guardia_core::repository::RoleRepository;
use tracing::{info, warn};

use crate::catalog::{PermissionCatalog, VIEW_OWN_PERMISSION};

/// The permissions a built-in role is meant to carry.
#[derive(Debug, Clone, Copy)]
pub enum RolePermissions {
    /// Every permission in the catalog.
    All,
    Listed(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct BuiltinRole {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: RolePermissions,
    pub is_system: bool,
    pub is_super: bool,
}

pub const BUILTIN_ROLES: &[BuiltinRole] = &[
    BuiltinRole {
        name: "admin",
        description: "Full access to every feature",
        permissions: RolePermissions::All,
        is_system: true,
        is_super: true,
    },
    BuiltinRole {
        name: "editor",
        description: "Create, edit, import and export records",
        permissions: RolePermissions::Listed(&[
            "net:view",
            "net:create",
            "net:edit",
            "net:import",
            "net:export",
            "report:view",
            "report:export",
        ]),
        is_system: true,
        is_super: false,
    },
    BuiltinRole {
        name: "viewer",
        description: "Read-only access to records and reports",
        permissions: RolePermissions::Listed(&["net:view", "report:view"]),
        is_system: true,
        is_super: false,
    },
    BuiltinRole {
        name: "user",
        description: "Access to the records you own",
        permissions: RolePermissions::Listed(&[VIEW_OWN_PERMISSION]),
        is_system: true,
        is_super: false,
    },
];

/// What a seeding run changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// Existing roles with a built-in name that are not system roles.
    pub skipped: Vec<String>,
    /// `(role, permission)` pairs dropped because the catalog lacks them.
    pub dropped_permissions: Vec<(String, String)>,
}

impl SeedReport {
    pub fn writes(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

pub struct RoleSeeder<R: RoleRepository> {
    roles: R,
    catalog: Arc<PermissionCatalog>,
    definitions: Vec<BuiltinRole>,
}

impl<R: RoleRepository> RoleSeeder<R> {
    pub fn new(roles: R, catalog: Arc<PermissionCatalog>) -> Self {
        Self::with_definitions(roles, catalog, BUILTIN_ROLES.to_vec())
    }

    pub fn with_definitions(
        roles: R,
        catalog: Arc<PermissionCatalog>,
        definitions: Vec<BuiltinRole>,
    ) -> Self {
        Self {
            roles,
            catalog,
            definitions,
        }
    }

    pub async fn seed(&self) -> GuardiaResult<SeedReport> {
        let mut report = SeedReport::default();

        for def in &self.definitions {
            let target = self.target_permissions(def, &mut report);

            let existing = match self.roles.get_by_name(def.name).await {
                Ok(role) => Some(role),
                Err(GuardiaError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };

            match existing {
                None => {
                    self.roles
                        .create(CreateRole {
                            name: def.name.to_owned(),
                            description: Some(def.description.to_owned()),
                            permissions: target,
                            is_system: def.is_system,
                            is_super: def.is_super,
                        })
                        .await?;
                    info!(role = def.name, "Created built-in role");
                    report.created.push(def.name.to_owned());
                }
                Some(role) if !role.is_system => {
                    warn!(
                        role = def.name,
                        "Role with a built-in name is not a system role; leaving it untouched"
                    );
                    report.skipped.push(def.name.to_owned());
                }
                Some(role) => {
                    if let Some(update) = reconcile(&role, &target, def.is_super) {
                        self.roles.update(role.id, update).await?;
                        info!(role = def.name, "Reconciled built-in role");
                        report.updated.push(def.name.to_owned());
                    } else {
                        report.unchanged.push(def.name.to_owned());
                    }
                }
            }
        }

        info!(
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            "Role seeding finished"
        );
        Ok(report)
    }

    fn target_permissions(&self, def: &BuiltinRole, report: &mut SeedReport) -> Vec<String> {
        match def.permissions {
            RolePermissions::All => self.catalog.names().map(str::to_owned).collect(),
            RolePermissions::Listed(list) => {
                let mut kept = Vec::with_capacity(list.len());
                for permission in list {
                    if self.catalog.contains(permission) {
                        if !kept.iter().any(|k: &String| k.as_str() == *permission) {
                            kept.push((*permission).to_owned());
                        }
                    } else {
                        warn!(
                            role = def.name,
                            permission,
                            "Dropping permission missing from the catalog"
                        );
                        report
                            .dropped_permissions
                            .push((def.name.to_owned(), (*permission).to_owned()));
                    }
                }
                kept
            }
        }
    }
}

/// The update that brings `role` in line with the target, if any.
fn reconcile(role: &Role, target: &[String], is_super: bool) -> Option<UpdateRole> {
    let stored: BTreeSet<&str> = role.permissions.iter().map(String::as_str).collect();
    let wanted: BTreeSet<&str> = target.iter().map(String::as_str).collect();

    let mut update = UpdateRole::default();
    if stored.symmetric_difference(&wanted).next().is_some() {
        update.permissions = Some(target.to_vec());
    }
    if role.is_super != is_super {
        update.is_super = Some(is_super);
    }

    (!update.is_empty()).then_some(update)
}
