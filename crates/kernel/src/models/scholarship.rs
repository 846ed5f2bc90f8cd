//! Scholarship listings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, sanitize_html, validate_slug};

/// Scholarship record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Scholarship {
    pub id: i32,
    pub title: String,
    pub slug: String,
    /// Short plain-text summary for listings.
    pub description: Option<String>,
    /// Sanitized HTML body.
    pub content: String,
    /// Free-form award amount ("Full tuition", "$5,000").
    pub amount: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub application_url: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub level_id: Option<i32>,
    pub country_id: Option<i32>,
    pub is_published: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Equality filters for listing scholarships.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScholarshipFilter {
    pub category_id: Option<i32>,
    pub level_id: Option<i32>,
    pub country_id: Option<i32>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub limit: Option<u32>,
}

impl ScholarshipFilter {
    pub fn matches(&self, s: &Scholarship) -> bool {
        self.category_id.is_none_or(|id| s.category_id == Some(id))
            && self.level_id.is_none_or(|id| s.level_id == Some(id))
            && self.country_id.is_none_or(|id| s.country_id == Some(id))
            && self.is_published.is_none_or(|p| s.is_published == p)
            && self.is_featured.is_none_or(|f| s.is_featured == f)
    }
}

/// Input for creating a scholarship.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateScholarship {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 255))]
    pub amount: Option<String>,
    pub deadline: Option<NaiveDate>,
    #[validate(url)]
    pub application_url: Option<String>,
    #[validate(length(max = 1000))]
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub level_id: Option<i32>,
    pub country_id: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

impl CreateScholarship {
    pub fn into_record(self, slug: String) -> Scholarship {
        let now = Utc::now();
        Scholarship {
            id: 0,
            title: self.title,
            slug,
            description: self.description,
            content: sanitize_html(&self.content),
            amount: self.amount,
            deadline: self.deadline,
            application_url: self.application_url,
            image_url: self.image_url,
            category_id: self.category_id,
            level_id: self.level_id,
            country_id: self.country_id,
            is_published: self.is_published,
            is_featured: self.is_featured,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a scholarship. Absent fields are left unchanged;
/// nullable fields accept an explicit `null` to clear them.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScholarship {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub amount: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub deadline: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub application_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub level_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country_id: Option<Option<i32>>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_description: Option<Option<String>>,
}

impl UpdateScholarship {
    pub fn apply(self, s: &mut Scholarship) {
        if let Some(title) = self.title {
            s.title = title;
        }
        if let Some(slug) = self.slug {
            s.slug = slug;
        }
        if let Some(description) = self.description {
            s.description = description;
        }
        if let Some(content) = self.content {
            s.content = sanitize_html(&content);
        }
        if let Some(amount) = self.amount {
            s.amount = amount;
        }
        if let Some(deadline) = self.deadline {
            s.deadline = deadline;
        }
        if let Some(application_url) = self.application_url {
            s.application_url = application_url;
        }
        if let Some(image_url) = self.image_url {
            s.image_url = image_url;
        }
        if let Some(category_id) = self.category_id {
            s.category_id = category_id;
        }
        if let Some(level_id) = self.level_id {
            s.level_id = level_id;
        }
        if let Some(country_id) = self.country_id {
            s.country_id = country_id;
        }
        if let Some(is_published) = self.is_published {
            s.is_published = is_published;
        }
        if let Some(is_featured) = self.is_featured {
            s.is_featured = is_featured;
        }
        if let Some(meta_title) = self.meta_title {
            s.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            s.meta_description = meta_description;
        }
        s.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Scholarship {
        let input: CreateScholarship = serde_json::from_str(
            r#"{"title":"DAAD Masters","categoryId":1,"levelId":2,"countryId":3,
                "isPublished":true,"deadline":"2025-10-31"}"#,
        )
        .unwrap();
        input.into_record("daad-masters".into())
    }

    #[test]
    fn filter_matches_equality_fields() {
        let s = sample();
        assert!(ScholarshipFilter::default().matches(&s));
        assert!(
            ScholarshipFilter {
                category_id: Some(1),
                is_published: Some(true),
                ..Default::default()
            }
            .matches(&s)
        );
        assert!(
            !ScholarshipFilter {
                country_id: Some(9),
                ..Default::default()
            }
            .matches(&s)
        );
        assert!(
            !ScholarshipFilter {
                is_featured: Some(true),
                ..Default::default()
            }
            .matches(&s)
        );
    }

    #[test]
    fn update_can_clear_foreign_keys() {
        let mut s = sample();
        let patch: UpdateScholarship =
            serde_json::from_str(r#"{"categoryId":null,"isFeatured":true}"#).unwrap();
        patch.apply(&mut s);
        assert_eq!(s.category_id, None);
        assert_eq!(s.level_id, Some(2));
        assert!(s.is_featured);
    }

    #[test]
    fn application_url_must_be_a_url() {
        let input: CreateScholarship =
            serde_json::from_str(r#"{"title":"X","applicationUrl":"nope"}"#).unwrap();
        assert!(input.validate().is_err());
    }
}
