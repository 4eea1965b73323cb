//! SurrealDB repository implementations.

mod account;
mod audit;
mod role;

pub use account::SurrealAccountRepository;
pub use audit::SurrealAuditLogRepository;
pub use role::SurrealRoleRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// The single row a by-id statement produced, or `NotFound`.
fn single<T>(rows: Vec<T>, entity: &str, id: Uuid) -> Result<T, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::not_found(entity, id.to_string()))
}

fn parse_id(raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::corrupt("UUID", e))
}
