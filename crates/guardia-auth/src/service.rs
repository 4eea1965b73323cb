//! Login service: credential check, lockout and session creation.

use std::sync::Arc;

use guardia_core::clock::{Clock, deadline};
use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::account::Account;
use guardia_core::models::session::{CreateSession, Session};
use guardia_core::repository::AccountRepository;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::session::SessionManager;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Login service.
///
/// Generic over the account repository so that the auth layer has no
/// dependency on the database crate.
pub struct LoginService<A: AccountRepository> {
    accounts: A,
    sessions: Arc<SessionManager>,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl<A: AccountRepository> LoginService<A> {
    pub fn new(
        accounts: A,
        sessions: Arc<SessionManager>,
        config: AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            sessions,
            config,
            clock,
        }
    }

    /// Authenticate with username/email + password and make the
    /// resulting session current.
    pub async fn login(&self, input: LoginInput) -> GuardiaResult<Session> {
        let ttl = self.config.session_ttl()?;

        // 1. Look up account: username first, then email.
        let account = self.find_account(&input.username_or_email).await?;

        // 2. Verify password.
        let valid = password::verify_password(
            &input.password,
            &account.password_hash,
            self.config.pepper.as_deref(),
        )?;

        // 3. A lock is only disclosed to someone holding the password;
        //    failures during a lock are not counted again.
        if account.is_locked_at(self.clock.now()) {
            return Err(if valid {
                AuthError::AccountLocked
            } else {
                AuthError::InvalidCredentials
            }
            .into());
        }

        if !valid {
            self.register_failure(&account).await?;
            return Err(AuthError::InvalidCredentials.into());
        }

        // 4. Clear failure state and start the session.
        if account.failed_login_attempts > 0 || account.locked_until.is_some() {
            self.accounts.reset_failed_attempts(account.id).await?;
        }

        let session = self.sessions.create(CreateSession {
            user_id: account.id,
            username: account.username,
            roles: account.roles,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            ttl,
        })?;

        info!(user_id = %session.user_id, session_id = %session.id, "Login succeeded");
        Ok(session)
    }

    /// End the current session.
    pub fn logout(&self) -> Option<Session> {
        self.sessions.destroy()
    }

    async fn find_account(&self, username_or_email: &str) -> GuardiaResult<Account> {
        match self.accounts.get_by_username(username_or_email).await {
            Ok(account) => Ok(account),
            Err(GuardiaError::NotFound { .. }) => self
                .accounts
                .find_by_email(&username_or_email.trim().to_lowercase())
                .await
                .map_err(|e| match e {
                    GuardiaError::NotFound { .. } => AuthError::InvalidCredentials.into(),
                    other => other,
                }),
            Err(e) => Err(e),
        }
    }

    async fn register_failure(&self, account: &Account) -> GuardiaResult<()> {
        let attempts = self.accounts.record_failed_login(account.id).await?;
        if attempts >= self.config.max_failed_login_attempts {
            let until = deadline(self.clock.now(), self.config.lockout_duration()?)?;
            self.accounts.lock_until(account.id, until).await?;
            warn!(user_id = %account.id, attempts, locked_until = %until, "Account locked");
        }
        Ok(())
    }
}
