//! Database-specific error types and conversions.

use guardia_core::error::GuardiaError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a failed statement. Unique index violations become
    /// [`DbError::Conflict`].
    pub(crate) fn statement(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Conflict(message)
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn corrupt(what: &str, err: impl std::fmt::Display) -> Self {
        DbError::Query(format!("invalid {what} in stored record: {err}"))
    }
}

impl From<DbError> for GuardiaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => GuardiaError::NotFound { entity, id },
            DbError::Conflict(reason) => GuardiaError::Conflict { reason },
            other => GuardiaError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_entity() {
        let err: GuardiaError = DbError::not_found("role", "abc").into();
        assert!(matches!(
            err,
            GuardiaError::NotFound { ref entity, ref id } if entity == "role" && id == "abc"
        ));
    }

    #[test]
    fn conflict_maps_to_conflict() {
        let err: GuardiaError = DbError::Conflict("dup".into()).into();
        assert!(matches!(err, GuardiaError::Conflict { .. }));
    }

    #[test]
    fn everything_else_is_database() {
        let err: GuardiaError = DbError::Migration("boom".into()).into();
        assert!(matches!(err, GuardiaError::Database(ref m) if m.contains("boom")));
    }
}
