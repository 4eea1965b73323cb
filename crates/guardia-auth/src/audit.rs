//! Audit sinks.

use chrono::Utc;
use guardia_core::audit::AuditSubject;
use guardia_core::error::GuardiaResult;
use guardia_core::models::audit::{AuditLogEntry, AuditOutcome, CreateAuditLogEntry};
use guardia_core::repository::AuditLogRepository;
use uuid::Uuid;

/// Writes audit entries to the `guardia::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

impl AuditLogRepository for TracingAuditLog {
    async fn append(&self, input: CreateAuditLogEntry) -> GuardiaResult<AuditLogEntry> {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            session_id: input.session_id,
            actor_id: input.actor_id,
            actor_username: input.actor_username,
            action: input.action,
            resource: input.resource,
            outcome: input.outcome,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            metadata: input.metadata,
            timestamp: Utc::now(),
        };

        tracing::info!(
            target: "guardia::audit",
            audit_id = %entry.id,
            session_id = %entry.session_id,
            actor_id = %entry.actor_id,
            actor = %entry.actor_username,
            action = %entry.action,
            resource = entry.resource.as_deref(),
            outcome = entry.outcome.as_str(),
            ip_address = entry.ip_address.as_deref(),
            metadata = %entry.metadata,
            "audit"
        );

        Ok(entry)
    }
}

/// Record `action` performed by `subject` through any audit sink.
pub async fn record<L, S>(
    log: &L,
    subject: &S,
    action: &str,
    resource: Option<String>,
    outcome: AuditOutcome,
) -> GuardiaResult<AuditLogEntry>
where
    L: AuditLogRepository,
    S: AuditSubject + ?Sized,
{
    log.append(CreateAuditLogEntry::from_subject(
        subject, action, resource, outcome,
    ))
    .await
}
