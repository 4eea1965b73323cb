//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_NAME_MIN_LEN: usize = 3;
pub const ROLE_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    /// Lower-case, unique.
    pub name: String,
    pub description: Option<String>,
    /// Ordered, duplicate-free permission identifiers.
    pub permissions: Vec<String>,
    /// Built-in roles cannot be deleted or renamed.
    pub is_system: bool,
    /// Grants every catalog permission.
    pub is_super: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub is_super: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
    pub is_super: Option<bool>,
}

impl UpdateRole {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.permissions.is_none()
            && self.is_super.is_none()
    }
}

/// Validate a role name (`[a-zA-Z0-9_]{3,50}`) and return its stored,
/// lower-case form.
pub fn normalize_role_name(name: &str) -> Option<String> {
    let len = name.chars().count();
    if !(ROLE_NAME_MIN_LEN..=ROLE_NAME_MAX_LEN).contains(&len) {
        return None;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(name.to_ascii_lowercase())
}

/// Canonical form of a list of role references held by an account or
/// session: trimmed, lower-case, non-empty, first occurrence kept.
pub fn normalize_role_refs(roles: impl IntoIterator<Item = String>) -> Vec<String> {
    dedup_preserving_order(
        roles
            .into_iter()
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty()),
    )
}

/// Drop duplicates while keeping first-seen order.
pub fn dedup_preserving_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
