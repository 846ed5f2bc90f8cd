//! Role records: a named set of permission identifiers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::double_option;

/// Role record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Permission identifiers from the catalog, sorted and de-duplicated.
    pub permissions: Vec<String>,
    /// Applied to users without an explicit role. At most one role holds it.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Sort and de-duplicate a permission list.
pub fn normalize_permissions(permissions: Vec<String>) -> Vec<String> {
    permissions
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Input for creating a role.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl CreateRole {
    /// The default flag is applied separately so the single-default rule
    /// holds; the record always starts without it.
    pub fn into_record(self) -> Role {
        let now = Utc::now();
        Role {
            id: 0,
            name: self.name.trim().to_string(),
            description: self.description,
            permissions: normalize_permissions(self.permissions),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a role.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub permissions: Option<Vec<String>>,
}

impl UpdateRole {
    pub fn apply(self, role: &mut Role) {
        if let Some(name) = self.name {
            role.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            role.description = description;
        }
        if let Some(permissions) = self.permissions {
            role.permissions = normalize_permissions(permissions);
        }
        role.updated_at = Utc::now();
    }
}
