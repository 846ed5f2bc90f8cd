//! Static pages (About, Contact, Privacy, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, sanitize_html, validate_slug};

/// Page record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i32,
    pub title: String,
    pub slug: String,
    /// Sanitized HTML body.
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_published: bool,
    pub show_in_header: bool,
    pub show_in_footer: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a page.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePage {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Derived from the title when omitted.
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub show_in_header: bool,
    #[serde(default)]
    pub show_in_footer: bool,
}

impl CreatePage {
    pub fn into_record(self, slug: String) -> Page {
        let now = Utc::now();
        Page {
            id: 0,
            title: self.title,
            slug,
            content: sanitize_html(&self.content),
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            meta_keywords: self.meta_keywords,
            is_published: self.is_published,
            show_in_header: self.show_in_header,
            show_in_footer: self.show_in_footer,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a page. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePage {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_keywords: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub show_in_header: Option<bool>,
    pub show_in_footer: Option<bool>,
}

impl UpdatePage {
    pub fn apply(self, page: &mut Page) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(slug) = self.slug {
            page.slug = slug;
        }
        if let Some(content) = self.content {
            page.content = sanitize_html(&content);
        }
        if let Some(meta_title) = self.meta_title {
            page.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            page.meta_description = meta_description;
        }
        if let Some(meta_keywords) = self.meta_keywords {
            page.meta_keywords = meta_keywords;
        }
        if let Some(is_published) = self.is_published {
            page.is_published = is_published;
        }
        if let Some(show_in_header) = self.show_in_header {
            page.show_in_header = show_in_header;
        }
        if let Some(show_in_footer) = self.show_in_footer {
            page.show_in_footer = show_in_footer;
        }
        page.updated_at = Utc::now();
    }
}
