//! SurrealDB implementation of [`AccountRepository`].
//!
//! Emails and role references are stored lower-cased so that the unique
//! index, `find_by_email` and `count_with_role` are case-insensitive. Password hashing happens in the
//! auth layer; this store only ever sees PHC strings.

use chrono::{DateTime, Utc};
use guardia_core::error::GuardiaResult;
use guardia_core::models::account::{Account, CreateAccount};
use guardia_core::models::role::normalize_role_refs;
use guardia_core::repository::AccountRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_id, single};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AccountRow {
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    failed_login_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self, id: Uuid) -> Account {
        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
            failed_login_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct AccountRowWithId {
    record_id: String,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
    failed_login_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRowWithId {
    fn try_into_account(self) -> Result<Account, DbError> {
        Ok(Account {
            id: parse_id(&self.record_id)?,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            roles: self.roles,
            failed_login_attempts: self.failed_login_attempts,
            locked_until: self.locked_until,
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the credential store.
#[derive(Clone)]
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &'static str, value: String) -> GuardiaResult<Account> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM account \
             WHERE {field} = $value LIMIT 1"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("value", value.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("account", value))?;
        Ok(row.try_into_account()?)
    }

    /// Apply a parameterless `SET` clause to one account.
    async fn update_fixed(&self, id: Uuid, sets: &'static str) -> GuardiaResult<AccountRow> {
        let query = format!(
            "UPDATE type::record('account', $id) SET {sets}, updated_at = time::now()"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "account", id)?)
    }
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> GuardiaResult<Account> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('account', $id) SET \
                 username = $username, email = $email, \
                 password_hash = $password_hash, roles = $roles, \
                 failed_login_attempts = 0, locked_until = NONE, \
                 reset_token_hash = NONE, reset_token_expires_at = NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("username", input.username))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("password_hash", input.password_hash))
            .bind(("roles", normalize_role_refs(input.roles)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "account", id)?.into_account(id))
    }

    async fn get_by_id(&self, id: Uuid) -> GuardiaResult<Account> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('account', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "account", id)?.into_account(id))
    }

    async fn get_by_username(&self, username: &str) -> GuardiaResult<Account> {
        self.find_one("username", username.to_owned()).await
    }

    async fn find_by_email(&self, email: &str) -> GuardiaResult<Account> {
        self.find_one("email", email.trim().to_lowercase()).await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> GuardiaResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 reset_token_hash = $token_hash, \
                 reset_token_expires_at = $expires_at, \
                 updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("token_hash", token_hash))
            .bind(("expires_at", expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        single(rows, "account", id)?;
        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> GuardiaResult<()> {
        self.update_fixed(
            id,
            "reset_token_hash = NONE, reset_token_expires_at = NONE",
        )
        .await?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> GuardiaResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 password_hash = $password_hash, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        single(rows, "account", id)?;
        Ok(())
    }

    async fn record_failed_login(&self, id: Uuid) -> GuardiaResult<u32> {
        let row = self
            .update_fixed(id, "failed_login_attempts += 1")
            .await?;
        Ok(row.failed_login_attempts)
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> GuardiaResult<()> {
        let result = self
            .db
            .query(
                "UPDATE type::record('account', $id) SET \
                 locked_until = $until, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("until", until))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        single(rows, "account", id)?;
        Ok(())
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> GuardiaResult<()> {
        self.update_fixed(id, "failed_login_attempts = 0, locked_until = NONE")
            .await?;
        Ok(())
    }

    async fn count_with_role(&self, role: &str) -> GuardiaResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM account \
                 WHERE roles CONTAINS $role GROUP ALL",
            )
            .bind(("role", role.to_lowercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
