//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use guardia_core::error::GuardiaResult;
use guardia_core::models::role::{CreateRole, Role, UpdateRole};
use guardia_core::repository::RoleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

/// Row returned by statements addressing a known record.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
    is_system: bool,
    is_super: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Role {
        Role {
            id,
            name: self.name,
            description: self.description,
            permissions: self.permissions,
            is_system: self.is_system,
            is_super: self.is_super,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row carrying the record key via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
    is_system: bool,
    is_super: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        Ok(Role {
            id: parse_id(&self.record_id)?,
            name: self.name,
            description: self.description,
            permissions: self.permissions,
            is_system: self.is_system,
            is_super: self.is_super,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the role store.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> GuardiaResult<Role> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, description = $description, \
                 permissions = $permissions, \
                 is_system = $is_system, is_super = $is_super",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name.to_lowercase()))
            .bind(("description", input.description))
            .bind(("permissions", input.permissions))
            .bind(("is_system", input.is_system))
            .bind(("is_super", input.is_super))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "role", id)?.into_role(id))
    }

    async fn get_by_id(&self, id: Uuid) -> GuardiaResult<Role> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "role", id)?.into_role(id))
    }

    async fn get_by_name(&self, name: &str) -> GuardiaResult<Role> {
        let name = name.to_lowercase();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role WHERE name = $name LIMIT 1")
            .bind(("name", name.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("role", name))?;
        Ok(row.try_into_role()?)
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> GuardiaResult<Role> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        if input.is_super.is_some() {
            sets.push("is_super = $is_super");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name.to_lowercase()));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", permissions));
        }
        if let Some(is_super) = input.is_super {
            builder = builder.bind(("is_super", is_super));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "role", id)?.into_role(id))
    }

    async fn delete(&self, id: Uuid) -> GuardiaResult<()> {
        let role = self.get_by_id(id).await?;
        if role.is_system {
            return Err(DbError::Conflict(format!(
                "system role '{}' cannot be deleted",
                role.name
            ))
            .into());
        }

        self.db
            .query("DELETE type::record('role', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::statement)?;

        Ok(())
    }

    async fn list(&self) -> GuardiaResult<Vec<Role>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM role ORDER BY name ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(RoleRowWithId::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
