//! Taxonomy terms: categories, study levels, countries and tags.
//!
//! All four vocabularies share one record shape and live in one table each.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, validate_slug};

/// Which vocabulary a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Category,
    Level,
    Country,
    Tag,
}

impl TermKind {
    pub const ALL: [TermKind; 4] = [
        TermKind::Category,
        TermKind::Level,
        TermKind::Country,
        TermKind::Tag,
    ];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            TermKind::Category => "categories",
            TermKind::Level => "levels",
            TermKind::Country => "countries",
            TermKind::Tag => "tags",
        }
    }

    /// Singular noun used in messages.
    pub fn label(self) -> &'static str {
        match self {
            TermKind::Category => "category",
            TermKind::Level => "level",
            TermKind::Country => "country",
            TermKind::Tag => "tag",
        }
    }

    /// Permission area guarding writes to this vocabulary.
    pub fn permission_area(self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Term record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Icon identifier or image URL.
    pub icon: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a term.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTerm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 255))]
    pub icon: Option<String>,
    #[serde(default, rename = "order")]
    pub sort_order: i32,
}

impl CreateTerm {
    pub fn into_record(self, slug: String) -> Term {
        let now = Utc::now();
        Term {
            id: 0,
            name: self.name,
            slug,
            description: self.description,
            icon: self.icon,
            sort_order: self.sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a term.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTerm {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl UpdateTerm {
    pub fn apply(self, term: &mut Term) {
        if let Some(name) = self.name {
            term.name = name;
        }
        if let Some(slug) = self.slug {
            term.slug = slug;
        }
        if let Some(description) = self.description {
            term.description = description;
        }
        if let Some(icon) = self.icon {
            term.icon = icon;
        }
        if let Some(sort_order) = self.sort_order {
            term.sort_order = sort_order;
        }
        term.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_distinct() {
        let tables: std::collections::HashSet<_> =
            TermKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), TermKind::ALL.len());
    }

    #[test]
    fn order_field_is_renamed() {
        let input: CreateTerm =
            serde_json::from_str(r#"{"name":"Engineering","order":4}"#).unwrap();
        let term = input.into_record("engineering".into());
        assert_eq!(term.sort_order, 4);
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["order"], 4);
    }
}
