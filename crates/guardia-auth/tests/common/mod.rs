//! In-memory repository doubles shared by the integration tests.
//!
//! Every double is cheap to clone; clones share state, so a test keeps a
//! handle while the service under test owns another.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use guardia_auth::password;
use guardia_auth::reset::ResetNotifier;
use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::account::{Account, CreateAccount};
use guardia_core::models::role::{CreateRole, Role, UpdateRole, normalize_role_refs};
use guardia_core::repository::{AccountRepository, RoleRepository};
use parking_lot::Mutex;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryRoles {
    roles: Arc<Mutex<Vec<Role>>>,
    lookups: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    fail_lookups: Arc<Mutex<bool>>,
}

impl InMemoryRoles {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock() = fail;
    }

    pub fn snapshot(&self, name: &str) -> Option<Role> {
        self.roles.lock().iter().find(|r| r.name == name).cloned()
    }

    /// Insert a super role directly, bypassing the write counter.
    pub fn insert_super(&self, name: &str) -> Role {
        let mut role = self.insert(name, &[], true);
        role.is_super = true;
        let mut roles = self.roles.lock();
        if let Some(stored) = roles.iter_mut().find(|r| r.id == role.id) {
            stored.is_super = true;
        }
        role
    }

    /// Insert a role directly, bypassing the write counter.
    pub fn insert(&self, name: &str, permissions: &[&str], is_system: bool) -> Role {
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
            is_system,
            is_super: false,
            created_at: now,
            updated_at: now,
        };
        self.roles.lock().push(role.clone());
        role
    }
}

impl RoleRepository for InMemoryRoles {
    async fn create(&self, input: CreateRole) -> GuardiaResult<Role> {
        let mut roles = self.roles.lock();
        if roles.iter().any(|r| r.name == input.name) {
            return Err(GuardiaError::conflict(format!("role '{}' exists", input.name)));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            permissions: input.permissions,
            is_system: input.is_system,
            is_super: input.is_super,
            created_at: now,
            updated_at: now,
        };
        roles.push(role.clone());
        Ok(role)
    }

    async fn get_by_id(&self, id: Uuid) -> GuardiaResult<Role> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.roles
            .lock()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| GuardiaError::not_found("role", id.to_string()))
    }

    async fn get_by_name(&self, name: &str) -> GuardiaResult<Role> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if *self.fail_lookups.lock() {
            return Err(GuardiaError::Database("connection reset".into()));
        }
        let name = name.to_ascii_lowercase();
        self.roles
            .lock()
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or_else(|| GuardiaError::not_found("role", name))
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> GuardiaResult<Role> {
        let mut roles = self.roles.lock();
        let role = roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GuardiaError::not_found("role", id.to_string()))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(name) = input.name {
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = description;
        }
        if let Some(permissions) = input.permissions {
            role.permissions = permissions;
        }
        if let Some(is_super) = input.is_super {
            role.is_super = is_super;
        }
        role.updated_at = Utc::now();
        Ok(role.clone())
    }

    async fn delete(&self, id: Uuid) -> GuardiaResult<()> {
        let mut roles = self.roles.lock();
        let Some(pos) = roles.iter().position(|r| r.id == id) else {
            return Err(GuardiaError::not_found("role", id.to_string()));
        };
        if roles[pos].is_system {
            return Err(GuardiaError::conflict("system role"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        roles.remove(pos);
        Ok(())
    }

    async fn list(&self) -> GuardiaResult<Vec<Role>> {
        Ok(self.roles.lock().clone())
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryAccounts {
    accounts: Arc<Mutex<Vec<Account>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryAccounts {
    /// Make every update of an existing account fail with `Database`.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    /// Add an account whose password is `password`, hashed for real.
    pub fn with_account(&self, username: &str, email: &str, password: &str, roles: &[&str]) -> Account {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.to_lowercase(),
            password_hash: password::hash_password(password, None).unwrap(),
            roles: normalize_role_refs(roles.iter().map(|r| (*r).to_owned())),
            failed_login_attempts: 0,
            locked_until: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.accounts.lock().push(account.clone());
        account
    }

    pub fn get(&self, id: Uuid) -> Account {
        self.accounts
            .lock()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("account exists")
    }

    fn modify<T>(&self, id: Uuid, f: impl FnOnce(&mut Account) -> T) -> GuardiaResult<T> {
        if *self.fail_writes.lock() {
            return Err(GuardiaError::Database("write refused".into()));
        }
        let mut accounts = self.accounts.lock();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| GuardiaError::not_found("account", id.to_string()))?;
        let out = f(account);
        account.updated_at = Utc::now();
        Ok(out)
    }

    fn find(&self, pred: impl Fn(&Account) -> bool, key: &str) -> GuardiaResult<Account> {
        self.accounts
            .lock()
            .iter()
            .find(|a| pred(a))
            .cloned()
            .ok_or_else(|| GuardiaError::not_found("account", key))
    }
}

impl AccountRepository for InMemoryAccounts {
    async fn create(&self, input: CreateAccount) -> GuardiaResult<Account> {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email.to_lowercase(),
            password_hash: input.password_hash,
            roles: normalize_role_refs(input.roles),
            failed_login_attempts: 0,
            locked_until: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        self.accounts.lock().push(account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> GuardiaResult<Account> {
        self.find(|a| a.id == id, &id.to_string())
    }

    async fn get_by_username(&self, username: &str) -> GuardiaResult<Account> {
        self.find(|a| a.username == username, username)
    }

    async fn find_by_email(&self, email: &str) -> GuardiaResult<Account> {
        let email = email.to_lowercase();
        self.find(|a| a.email == email, &email)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> GuardiaResult<()> {
        self.modify(id, |a| {
            a.reset_token_hash = Some(token_hash);
            a.reset_token_expires_at = Some(expires_at);
        })
    }

    async fn clear_reset_token(&self, id: Uuid) -> GuardiaResult<()> {
        self.modify(id, |a| {
            a.reset_token_hash = None;
            a.reset_token_expires_at = None;
        })
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> GuardiaResult<()> {
        self.modify(id, |a| a.password_hash = password_hash)
    }

    async fn record_failed_login(&self, id: Uuid) -> GuardiaResult<u32> {
        self.modify(id, |a| {
            a.failed_login_attempts += 1;
            a.failed_login_attempts
        })
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> GuardiaResult<()> {
        self.modify(id, |a| a.locked_until = Some(until))
    }

    async fn reset_failed_attempts(&self, id: Uuid) -> GuardiaResult<()> {
        self.modify(id, |a| {
            a.failed_login_attempts = 0;
            a.locked_until = None;
        })
    }

    async fn count_with_role(&self, role: &str) -> GuardiaResult<u64> {
        let role = role.to_ascii_lowercase();
        Ok(self
            .accounts
            .lock()
            .iter()
            .filter(|a| a.roles.iter().any(|r| *r == role))
            .count() as u64)
    }
}

// ---------------------------------------------------------------------------
// Reset notifier
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CapturingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl CapturingNotifier {
    /// `(email, raw token)` pairs in delivery order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, token)| token.clone())
    }
}

impl ResetNotifier for CapturingNotifier {
    async fn deliver(
        &self,
        account: &Account,
        raw_token: &str,
        _expires_at: DateTime<Utc>,
    ) -> GuardiaResult<()> {
        self.sent
            .lock()
            .push((account.email.clone(), raw_token.to_owned()));
        Ok(())
    }
}

/// A notifier whose transport is always down.
#[derive(Clone, Copy, Default)]
pub struct FailingNotifier;

impl ResetNotifier for FailingNotifier {
    async fn deliver(
        &self,
        _account: &Account,
        _raw_token: &str,
        _expires_at: DateTime<Utc>,
    ) -> GuardiaResult<()> {
        Err(GuardiaError::Internal("smtp down".into()))
    }
}
