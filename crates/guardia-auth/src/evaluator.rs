//! Role-based permission evaluation.
//!
//! Decision order for `evaluate`:
//!
//! 1. the permission must exist in the catalog (`PermissionNotDefined`
//!    otherwise, whatever the session state);
//! 2. a session must be supplied (`Unauthenticated`);
//! 3. a session holding the configured super role is granted without
//!    touching the role store;
//! 4. the session's roles are resolved in order; the first role that is
//!    flagged `is_super` or lists the permission (and, for an
//!    ownership-scoped permission, matches the supplied owner) grants.
//!
//! A role name with no stored record is skipped with a warning so that a
//! session survives one of its roles being deleted underneath it. Any
//! other role store failure is propagated.

use std::collections::BTreeSet;
use std::sync::Arc;

use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::permission::{OwnerField, PermissionDef, PermissionScope, ResourceOwner};
use guardia_core::models::role::Role;
use guardia_core::models::session::Session;
use guardia_core::repository::RoleRepository;
use tracing::{debug, warn};

use crate::catalog::PermissionCatalog;
use crate::session::SessionManager;

pub struct PermissionEvaluator<R: RoleRepository> {
    roles: R,
    catalog: Arc<PermissionCatalog>,
    super_role: String,
}

impl<R: RoleRepository> PermissionEvaluator<R> {
    pub fn new(roles: R, catalog: Arc<PermissionCatalog>, super_role: impl Into<String>) -> Self {
        Self {
            roles,
            catalog,
            super_role: super_role.into(),
        }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Whether `session` holds `permission`, optionally for a resource
    /// owned by `owner`.
    ///
    /// Returns `Ok(false)` for an ordinary denial. Errors are reserved
    /// for programming mistakes (`PermissionNotDefined`), a missing
    /// session (`Unauthenticated`) and role store failures.
    pub async fn evaluate(
        &self,
        session: Option<&Session>,
        permission: &str,
        owner: Option<ResourceOwner<'_>>,
    ) -> GuardiaResult<bool> {
        let def = self.definition(permission)?;
        let session = session.ok_or(GuardiaError::Unauthenticated)?;

        if self.holds_super_role(session) {
            debug!(
                user_id = %session.user_id,
                permission,
                "Granted by super role"
            );
            return Ok(true);
        }

        for role_name in &session.roles {
            let Some(role) = self.resolve(role_name).await? else {
                continue;
            };

            if role.is_super {
                debug!(user_id = %session.user_id, role = %role.name, permission, "Granted by super role flag");
                return Ok(true);
            }
            if !role.has_permission(permission) {
                continue;
            }

            match def.scope {
                PermissionScope::Global => {
                    debug!(user_id = %session.user_id, role = %role.name, permission, "Granted");
                    return Ok(true);
                }
                PermissionScope::Owner(field) => {
                    if owns(session, field, owner) {
                        debug!(user_id = %session.user_id, role = %role.name, permission, "Granted to owner");
                        return Ok(true);
                    }
                    debug!(
                        user_id = %session.user_id,
                        role = %role.name,
                        permission,
                        owner_supplied = owner.is_some(),
                        "Ownership check failed"
                    );
                }
            }
        }

        debug!(user_id = %session.user_id, permission, "Denied");
        Ok(false)
    }

    /// Like [`evaluate`](Self::evaluate), but a denial is the
    /// `PermissionDenied` error.
    pub async fn require(
        &self,
        session: Option<&Session>,
        permission: &str,
        owner: Option<ResourceOwner<'_>>,
    ) -> GuardiaResult<()> {
        if self.evaluate(session, permission, owner).await? {
            Ok(())
        } else {
            Err(GuardiaError::PermissionDenied {
                permission: permission.to_owned(),
            })
        }
    }

    /// Evaluate against the manager's current session.
    ///
    /// No current session reads as `Unauthenticated`; an expired one
    /// stays `SessionExpired` so the caller can prompt for re-login.
    pub async fn evaluate_current(
        &self,
        sessions: &SessionManager,
        permission: &str,
        owner: Option<ResourceOwner<'_>>,
    ) -> GuardiaResult<bool> {
        self.definition(permission)?;
        let session = current_or_unauthenticated(sessions)?;
        self.evaluate(Some(&session), permission, owner).await
    }

    pub async fn require_current(
        &self,
        sessions: &SessionManager,
        permission: &str,
        owner: Option<ResourceOwner<'_>>,
    ) -> GuardiaResult<()> {
        self.definition(permission)?;
        let session = current_or_unauthenticated(sessions)?;
        self.require(Some(&session), permission, owner).await
    }

    /// Every catalog permission the session's roles hold, ownership
    /// scoped ones included. A super role holds the whole catalog.
    pub async fn effective_permissions(&self, session: &Session) -> GuardiaResult<BTreeSet<String>> {
        let all = || -> BTreeSet<String> { self.catalog.names().map(str::to_owned).collect() };
        if self.holds_super_role(session) {
            return Ok(all());
        }

        let mut granted = BTreeSet::new();
        for role_name in &session.roles {
            let Some(role) = self.resolve(role_name).await? else {
                continue;
            };
            if role.is_super {
                return Ok(all());
            }
            granted.extend(
                role.permissions
                    .into_iter()
                    .filter(|p| self.catalog.contains(p)),
            );
        }
        Ok(granted)
    }

    fn definition(&self, permission: &str) -> GuardiaResult<&PermissionDef> {
        self.catalog
            .get(permission)
            .ok_or_else(|| GuardiaError::PermissionNotDefined {
                permission: permission.to_owned(),
            })
    }

    fn holds_super_role(&self, session: &Session) -> bool {
        session.has_role(&self.super_role)
    }

    async fn resolve(&self, role_name: &str) -> GuardiaResult<Option<Role>> {
        match self.roles.get_by_name(role_name).await {
            Ok(role) => Ok(Some(role)),
            Err(GuardiaError::NotFound { .. }) => {
                warn!(
                    role = %role_name,
                    "Session references a role with no stored record; skipping"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn current_or_unauthenticated(sessions: &SessionManager) -> GuardiaResult<Session> {
    sessions.current().map_err(|e| match e {
        GuardiaError::NotFound { .. } => GuardiaError::Unauthenticated,
        other => other,
    })
}

fn owns(session: &Session, field: OwnerField, owner: Option<ResourceOwner<'_>>) -> bool {
    match (field, owner) {
        (OwnerField::Username, Some(ResourceOwner::Username(name))) => session.username == name,
        (OwnerField::UserId, Some(ResourceOwner::UserId(id))) => session.user_id == id,
        _ => false,
    }
}
