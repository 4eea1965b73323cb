//! Permission domain model.
//!
//! A permission is an opaque `resource:action` identifier registered once
//! in the permission catalog. Its [`PermissionScope`] tells the evaluator
//! whether holding it is enough, or whether the acting session must also
//! own the targeted resource.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which session attribute an ownership-scoped permission compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerField {
    Username,
    UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionScope {
    /// Holding the permission grants it.
    Global,
    /// Holding the permission grants it only for resources owned by the
    /// acting session, as identified by the given field.
    Owner(OwnerField),
}

impl PermissionScope {
    pub fn is_ownership_scoped(&self) -> bool {
        matches!(self, PermissionScope::Owner(_))
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub name: String,
    pub description: String,
    pub scope: PermissionScope,
}

/// The owner of a concrete resource, as supplied by the caller of an
/// ownership-scoped check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOwner<'a> {
    Username(&'a str),
    UserId(Uuid),
}

impl ResourceOwner<'_> {
    pub fn field(&self) -> OwnerField {
        match self {
            ResourceOwner::Username(_) => OwnerField::Username,
            ResourceOwner::UserId(_) => OwnerField::UserId,
        }
    }
}

/// Check that `name` has the `resource:action` shape: exactly two
/// non-empty segments of `[a-z0-9_]`.
pub fn is_valid_permission_name(name: &str) -> bool {
    let mut parts = name.split(':');
    let (Some(resource), Some(action), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    [resource, action].iter().all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    })
}
