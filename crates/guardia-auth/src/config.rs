//! Authentication configuration.

use chrono::Duration;
use guardia_core::error::{GuardiaError, GuardiaResult};

/// Configuration for the session, login and reset services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to passwords before Argon2id hashing
    /// and verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Session lifetime in seconds (default: 28_800 = 8 hours).
    pub session_lifetime_secs: u64,
    /// Reset token lifetime in seconds (default: 3600 = 1 hour).
    pub reset_token_lifetime_secs: u64,
    /// Max consecutive failed login attempts before lockout (default: 5).
    pub max_failed_login_attempts: u32,
    /// Lockout duration in seconds (default: 300 = 5 min).
    pub lockout_duration_secs: u64,
    /// Role name granted every permission without a role store lookup.
    pub super_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 12,
            session_lifetime_secs: 28_800,
            reset_token_lifetime_secs: 3600,
            max_failed_login_attempts: 5,
            lockout_duration_secs: 300,
            super_role: "admin".into(),
        }
    }
}

impl AuthConfig {
    /// Defaults overridden by `GUARDIA_PEPPER`,
    /// `GUARDIA_SESSION_LIFETIME_SECS` and
    /// `GUARDIA_RESET_TOKEN_LIFETIME_SECS`.
    pub fn from_env() -> GuardiaResult<Self> {
        let mut config = Self::default();

        if let Ok(pepper) = std::env::var("GUARDIA_PEPPER") {
            if !pepper.is_empty() {
                config.pepper = Some(pepper);
            }
        }
        if let Some(secs) = env_secs("GUARDIA_SESSION_LIFETIME_SECS")? {
            config.session_lifetime_secs = secs;
        }
        if let Some(secs) = env_secs("GUARDIA_RESET_TOKEN_LIFETIME_SECS")? {
            config.reset_token_lifetime_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject lifetimes that do not fit a `chrono::Duration`.
    pub fn validate(&self) -> GuardiaResult<()> {
        self.session_ttl()?;
        self.reset_token_ttl()?;
        self.lockout_duration()?;
        Ok(())
    }

    pub fn session_ttl(&self) -> GuardiaResult<Duration> {
        secs_to_duration("session lifetime", self.session_lifetime_secs)
    }

    pub fn reset_token_ttl(&self) -> GuardiaResult<Duration> {
        secs_to_duration("reset token lifetime", self.reset_token_lifetime_secs)
    }

    pub fn lockout_duration(&self) -> GuardiaResult<Duration> {
        secs_to_duration("lockout duration", self.lockout_duration_secs)
    }
}

fn secs_to_duration(what: &str, secs: u64) -> GuardiaResult<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| GuardiaError::Validation {
            message: format!("{what} of {secs}s is out of range"),
        })
}

fn env_secs(key: &str) -> GuardiaResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| GuardiaError::Validation {
                message: format!("{key} must be a whole number of seconds, got {raw:?}"),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl().unwrap(), Duration::hours(8));
        assert_eq!(config.reset_token_ttl().unwrap(), Duration::hours(1));
        assert_eq!(config.lockout_duration().unwrap(), Duration::minutes(5));
        assert_eq!(config.super_role, "admin");
        config.validate().unwrap();
    }

    #[test]
    fn oversized_lifetimes_are_rejected() {
        let config = AuthConfig {
            session_lifetime_secs: 10_u64.pow(16),
            ..Default::default()
        };
        assert!(matches!(
            config.session_ttl(),
            Err(GuardiaError::Validation { .. })
        ));
        assert!(config.validate().is_err());

        let config = AuthConfig {
            reset_token_lifetime_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.reset_token_ttl(),
            Err(GuardiaError::Validation { .. })
        ));
    }
}
