//! Administrative role management.

use std::sync::Arc;

use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::role::{
    CreateRole, Role, UpdateRole, dedup_preserving_order, normalize_role_name,
};
use guardia_core::repository::{AccountRepository, RoleRepository};
use tracing::info;
use uuid::Uuid;

use crate::catalog::PermissionCatalog;

/// Input for creating a non-system role.
#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

pub struct RoleService<R: RoleRepository, A: AccountRepository> {
    roles: R,
    accounts: A,
    catalog: Arc<PermissionCatalog>,
}

impl<R: RoleRepository, A: AccountRepository> RoleService<R, A> {
    pub fn new(roles: R, accounts: A, catalog: Arc<PermissionCatalog>) -> Self {
        Self {
            roles,
            accounts,
            catalog,
        }
    }

    pub async fn get_role(&self, id: Uuid) -> GuardiaResult<Role> {
        self.roles.get_by_id(id).await
    }

    pub async fn list_roles(&self) -> GuardiaResult<Vec<Role>> {
        self.roles.list().await
    }

    /// Create an ordinary (non-system) role. Only the seeder creates
    /// system roles.
    pub async fn create_role(&self, input: NewRole) -> GuardiaResult<Role> {
        let name = validate_name(&input.name)?;
        let permissions = self.validate_permissions(input.permissions)?;

        let role = self
            .roles
            .create(CreateRole {
                name,
                description: input.description,
                permissions,
                is_system: false,
                is_super: false,
            })
            .await?;

        info!(role = %role.name, role_id = %role.id, "Role created");
        Ok(role)
    }

    /// Edit a role. System roles keep their name; their permissions may
    /// still be edited (the seeder will reconcile them at next startup).
    pub async fn update_role(&self, id: Uuid, mut input: UpdateRole) -> GuardiaResult<Role> {
        let current = self.roles.get_by_id(id).await?;

        if let Some(name) = input.name.take() {
            let name = validate_name(&name)?;
            if name != current.name {
                if current.is_system {
                    return Err(GuardiaError::conflict(format!(
                        "system role '{}' cannot be renamed",
                        current.name
                    )));
                }
                input.name = Some(name);
            }
        }
        if let Some(permissions) = input.permissions.take() {
            input.permissions = Some(self.validate_permissions(permissions)?);
        }
        if input.is_super.is_some() && !current.is_system {
            return Err(GuardiaError::Validation {
                message: "only built-in roles carry the super capability".into(),
            });
        }

        if input.is_empty() {
            return Ok(current);
        }

        let role = self.roles.update(id, input).await?;
        info!(role = %role.name, role_id = %role.id, "Role updated");
        Ok(role)
    }

    /// Delete a role that is neither a system role nor assigned to any
    /// account.
    pub async fn delete_role(&self, id: Uuid) -> GuardiaResult<()> {
        let role = self.roles.get_by_id(id).await?;

        if role.is_system {
            return Err(GuardiaError::conflict(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }

        let holders = self.accounts.count_with_role(&role.name).await?;
        if holders > 0 {
            return Err(GuardiaError::conflict(format!(
                "role '{}' is assigned to {holders} account(s)",
                role.name
            )));
        }

        self.roles.delete(id).await?;
        info!(role = %role.name, role_id = %role.id, "Role deleted");
        Ok(())
    }

    fn validate_permissions(&self, permissions: Vec<String>) -> GuardiaResult<Vec<String>> {
        if let Some(unknown) = permissions.iter().find(|p| !self.catalog.contains(p)) {
            return Err(GuardiaError::PermissionNotDefined {
                permission: unknown.clone(),
            });
        }
        Ok(dedup_preserving_order(permissions))
    }
}

fn validate_name(name: &str) -> GuardiaResult<String> {
    normalize_role_name(name.trim()).ok_or_else(|| GuardiaError::Validation {
        message: format!(
            "role name {name:?} must be 3-50 characters of letters, digits or underscore"
        ),
    })
}
