//! The audit hook contract.
//!
//! An audit logger formats entries through [`AuditSubject`] and never
//! depends on a concrete session type.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub trait AuditSubject {
    fn session_id(&self) -> Uuid;
    fn user_id(&self) -> Uuid;
    fn username(&self) -> &str;
    fn role_names(&self) -> &[String];
    fn ip_address(&self) -> Option<&str>;
    fn user_agent(&self) -> Option<&str>;
    fn created_at(&self) -> DateTime<Utc>;
    fn last_activity(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> DateTime<Utc>;
    fn metadata(&self) -> &Map<String, Value>;
}
