//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! The table only grants create and select; entries are never updated
//! or deleted.

use chrono::{DateTime, Utc};
use guardia_core::error::GuardiaResult;
use guardia_core::models::audit::{AuditLogEntry, AuditOutcome, CreateAuditLogEntry};
use guardia_core::repository::AuditLogRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_id, single};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditLogRow {
    session_id: String,
    actor_id: String,
    actor_username: String,
    action: String,
    resource: Option<String>,
    outcome: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: serde_json::Value,
    timestamp: DateTime<Utc>,
}

fn parse_outcome(s: &str) -> Result<AuditOutcome, DbError> {
    match s {
        "Success" => Ok(AuditOutcome::Success),
        "Failure" => Ok(AuditOutcome::Failure),
        "Denied" => Ok(AuditOutcome::Denied),
        other => Err(DbError::corrupt("audit outcome", other)),
    }
}

impl AuditLogRow {
    fn try_into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        Ok(AuditLogEntry {
            id,
            session_id: parse_id(&self.session_id)?,
            actor_id: parse_id(&self.actor_id)?,
            actor_username: self.actor_username,
            action: self.action,
            resource: self.resource,
            outcome: parse_outcome(&self.outcome)?,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: self.metadata,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the append-only audit log.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> GuardiaResult<AuditLogEntry> {
        let id = Uuid::new_v4();

        let metadata = if input.metadata.is_object() {
            input.metadata
        } else {
            serde_json::json!({ "value": input.metadata })
        };

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 session_id = $session_id, actor_id = $actor_id, \
                 actor_username = $actor_username, action = $action, \
                 resource = $resource, outcome = $outcome, \
                 ip_address = $ip_address, user_agent = $user_agent, \
                 metadata = $metadata",
            )
            .bind(("id", id.to_string()))
            .bind(("session_id", input.session_id.to_string()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("actor_username", input.actor_username))
            .bind(("action", input.action))
            .bind(("resource", input.resource))
            .bind(("outcome", input.outcome.as_str().to_owned()))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::statement)?;
        let rows: Vec<AuditLogRow> = result.take(0).map_err(DbError::from)?;
        Ok(single(rows, "audit_log", id)?.try_into_entry(id)?)
    }
}
