//! Audit log domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::AuditSubject;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "Success",
            AuditOutcome::Failure => "Failure",
            AuditOutcome::Denied => "Denied",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub actor_id: Uuid,
    pub actor_username: String,
    pub action: String,
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuditLogEntry {
    pub session_id: Uuid,
    pub actor_id: Uuid,
    pub actor_username: String,
    pub action: String,
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
}

impl CreateAuditLogEntry {
    /// Build an entry from anything that exposes the audit hook fields.
    ///
    /// The subject's role names and session window are folded into the
    /// entry metadata next to the subject's own metadata map.
    pub fn from_subject<S: AuditSubject + ?Sized>(
        subject: &S,
        action: impl Into<String>,
        resource: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        let metadata = serde_json::json!({
            "roles": subject.role_names(),
            "session_created_at": subject.created_at(),
            "session_last_activity": subject.last_activity(),
            "session_expires_at": subject.expires_at(),
            "session": subject.metadata(),
        });

        Self {
            session_id: subject.session_id(),
            actor_id: subject.user_id(),
            actor_username: subject.username().to_owned(),
            action: action.into(),
            resource,
            outcome,
            ip_address: subject.ip_address().map(str::to_owned),
            user_agent: subject.user_agent().map(str::to_owned),
            metadata,
        }
    }
}
