//! Error types for the guardia subsystem.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardiaError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Session has expired, please log in again")]
    SessionExpired,

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Permission is not defined: {permission}")]
    PermissionNotDefined { permission: String },

    #[error("Not permitted: {permission}")]
    PermissionDenied { permission: String },

    #[error("Invalid or already used reset token")]
    InvalidToken,

    #[error("Reset token has expired")]
    TokenExpired,

    #[error("Password does not meet policy: {reason}")]
    WeakPassword { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuardiaError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Whether this is a lookup miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type GuardiaResult<T> = Result<T, GuardiaError>;
