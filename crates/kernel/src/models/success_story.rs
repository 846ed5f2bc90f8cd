//! Testimonials from scholarship recipients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, sanitize_html};

/// Success story record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SuccessStory {
    pub id: i32,
    /// Recipient's name.
    pub name: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub scholarship_id: Option<i32>,
    pub country: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSuccessStory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 1000))]
    pub image_url: Option<String>,
    pub scholarship_id: Option<i32>,
    #[validate(length(max = 255))]
    pub country: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl CreateSuccessStory {
    pub fn into_record(self) -> SuccessStory {
        let now = Utc::now();
        SuccessStory {
            id: 0,
            name: self.name,
            title: self.title,
            content: sanitize_html(&self.content),
            image_url: self.image_url,
            scholarship_id: self.scholarship_id,
            country: self.country,
            is_published: self.is_published,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSuccessStory {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scholarship_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    pub is_published: Option<bool>,
}

impl UpdateSuccessStory {
    pub fn apply(self, story: &mut SuccessStory) {
        if let Some(name) = self.name {
            story.name = name;
        }
        if let Some(title) = self.title {
            story.title = title;
        }
        if let Some(content) = self.content {
            story.content = sanitize_html(&content);
        }
        if let Some(image_url) = self.image_url {
            story.image_url = image_url;
        }
        if let Some(scholarship_id) = self.scholarship_id {
            story.scholarship_id = scholarship_id;
        }
        if let Some(country) = self.country {
            story.country = country;
        }
        if let Some(is_published) = self.is_published {
            story.is_published = is_published;
        }
        story.updated_at = Utc::now();
    }
}
