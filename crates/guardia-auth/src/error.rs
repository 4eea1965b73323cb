//! Authentication error types.

use guardia_core::error::GuardiaError;
use thiserror::Error;

use crate::password::PolicyViolation;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked,

    #[error("password does not meet policy: {}", join_violations(.0))]
    WeakPassword(Vec<PolicyViolation>),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

fn join_violations(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<AuthError> for GuardiaError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountLocked => {
                GuardiaError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::WeakPassword(violations) => GuardiaError::WeakPassword {
                reason: join_violations(&violations),
            },
            AuthError::Crypto(msg) => GuardiaError::Crypto(msg),
        }
    }
}
