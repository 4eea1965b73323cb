//! Password recovery through single-use, time-boxed reset tokens.
//!
//! Only the SHA-256 hash of a token is stored; the plaintext goes to the
//! [`ResetNotifier`] exactly once and is never logged. Each account holds
//! at most one pending token: issuing a new one overwrites the stored
//! hash/expiry pair, so concurrent requests resolve last-write-wins.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use guardia_core::clock::{Clock, deadline};
use guardia_core::error::{GuardiaError, GuardiaResult};
use guardia_core::models::account::Account;
use guardia_core::repository::AccountRepository;
use tracing::{debug, error, info};

use crate::config::AuthConfig;
use crate::password;
use crate::token;

/// Hands the plaintext token to the user (e-mail, on-screen code, ...).
pub trait ResetNotifier: Send + Sync {
    fn deliver(
        &self,
        account: &Account,
        raw_token: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = GuardiaResult<()>> + Send;
}

pub struct PasswordResetService<A: AccountRepository, N: ResetNotifier> {
    accounts: A,
    notifier: N,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
}

impl<A: AccountRepository, N: ResetNotifier> PasswordResetService<A, N> {
    pub fn new(accounts: A, notifier: N, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts,
            notifier,
            config,
            clock,
        }
    }

    /// Request a reset for `email`.
    ///
    /// Succeeds identically whether or not an account exists, so the
    /// caller learns nothing about registered addresses. Only failures
    /// that any address can hit (configuration, the lookup itself) are
    /// returned; storing or delivering the token for a found account is
    /// logged and reported as success.
    pub async fn initiate(&self, email: &str, origin_ip: Option<&str>) -> GuardiaResult<()> {
        let email = normalize_email(email);
        let expires_at = deadline(self.clock.now(), self.config.reset_token_ttl()?)?;

        let account = match self.accounts.find_by_email(&email).await {
            Ok(account) => account,
            Err(GuardiaError::NotFound { .. }) => {
                debug!(origin_ip, "Reset requested for unknown address; ignoring");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let raw = token::generate_reset_token();

        if let Err(e) = self
            .accounts
            .set_reset_token(account.id, token::hash_reset_token(&raw), expires_at)
            .await
        {
            error!(user_id = %account.id, origin_ip, error = %e, "Storing reset token failed");
            return Ok(());
        }

        info!(
            user_id = %account.id,
            origin_ip,
            expires_at = %expires_at,
            "Password reset token issued"
        );

        if let Err(e) = self.notifier.deliver(&account, &raw, expires_at).await {
            error!(user_id = %account.id, error = %e, "Delivering reset token failed");
        }
        Ok(())
    }

    /// Redeem `raw_token` and set `new_password`.
    ///
    /// An unknown address, no pending token and a wrong token all fail
    /// with `InvalidToken`. An expired token fails with `TokenExpired`
    /// and is discarded. A weak password fails with `WeakPassword` and
    /// leaves the token redeemable.
    pub async fn confirm(&self, email: &str, raw_token: &str, new_password: &str) -> GuardiaResult<()> {
        let email = normalize_email(email);
        let account = match self.accounts.find_by_email(&email).await {
            Ok(account) => account,
            Err(GuardiaError::NotFound { .. }) => return Err(GuardiaError::InvalidToken),
            Err(e) => return Err(e),
        };

        let (Some(stored_hash), Some(expires_at)) =
            (&account.reset_token_hash, account.reset_token_expires_at)
        else {
            return Err(GuardiaError::InvalidToken);
        };

        let presented = token::hash_reset_token(raw_token);
        if !token::token_hashes_match(stored_hash, &presented) {
            debug!(user_id = %account.id, "Reset token mismatch");
            return Err(GuardiaError::InvalidToken);
        }

        if self.clock.now() >= expires_at {
            self.accounts.clear_reset_token(account.id).await?;
            info!(user_id = %account.id, "Expired reset token discarded");
            return Err(GuardiaError::TokenExpired);
        }

        password::validate_password_strength(new_password, self.config.min_password_length)?;
        let hash = password::hash_password(new_password, self.config.pepper.as_deref())?;

        self.accounts.set_password_hash(account.id, hash).await?;
        self.accounts.clear_reset_token(account.id).await?;
        self.accounts.reset_failed_attempts(account.id).await?;

        info!(user_id = %account.id, "Password reset completed");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
