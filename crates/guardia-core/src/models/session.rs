//! Session domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::audit::AuditSubject;

/// One authenticated actor for the lifetime of an interactive use.
///
/// `created_at <= last_activity <= expires_at` holds for every session
/// handed out by the session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    /// Ordered, duplicate-free, lower-case role names.
    pub roles: Vec<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl Session {
    /// A session is live strictly before its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub ttl: Duration,
}

impl AuditSubject for Session {
    fn session_id(&self) -> Uuid {
        self.id
    }

    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn role_names(&self) -> &[String] {
        &self.roles
    }

    fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
