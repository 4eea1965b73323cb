//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Each write is treated as its own
//! transaction; callers never assume atomicity across calls.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GuardiaResult;
use crate::models::{
    account::{Account, CreateAccount},
    audit::{AuditLogEntry, CreateAuditLogEntry},
    role::{CreateRole, Role, UpdateRole},
};

// ---------------------------------------------------------------------------
// Role store
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    /// Fails with `Conflict` if a role with the same name exists.
    fn create(&self, input: CreateRole) -> impl Future<Output = GuardiaResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GuardiaResult<Role>> + Send;
    /// `name` is matched against the stored lower-case name.
    fn get_by_name(&self, name: &str) -> impl Future<Output = GuardiaResult<Role>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = GuardiaResult<Role>> + Send;
    /// Hard delete. Fails with `Conflict` for system roles.
    fn delete(&self, id: Uuid) -> impl Future<Output = GuardiaResult<()>> + Send;
    fn list(&self) -> impl Future<Output = GuardiaResult<Vec<Role>>> + Send;
}

// ---------------------------------------------------------------------------
// Credential store
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    fn create(&self, input: CreateAccount) -> impl Future<Output = GuardiaResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GuardiaResult<Account>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = GuardiaResult<Account>> + Send;
    /// `email` is compared case-insensitively.
    fn find_by_email(&self, email: &str) -> impl Future<Output = GuardiaResult<Account>> + Send;

    /// Overwrite the single stored reset token hash/expiry pair.
    fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = GuardiaResult<()>> + Send;
    fn clear_reset_token(&self, id: Uuid) -> impl Future<Output = GuardiaResult<()>> + Send;
    fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: String,
    ) -> impl Future<Output = GuardiaResult<()>> + Send;

    /// Increment the failed-login counter and return the new value.
    fn record_failed_login(&self, id: Uuid) -> impl Future<Output = GuardiaResult<u32>> + Send;
    fn lock_until(
        &self,
        id: Uuid,
        until: DateTime<Utc>,
    ) -> impl Future<Output = GuardiaResult<()>> + Send;
    /// Zero the failed-login counter and lift any lock.
    fn reset_failed_attempts(&self, id: Uuid) -> impl Future<Output = GuardiaResult<()>> + Send;

    /// Number of accounts holding the given role name.
    fn count_with_role(&self, role: &str) -> impl Future<Output = GuardiaResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Audit log
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = GuardiaResult<AuditLogEntry>> + Send;
}
