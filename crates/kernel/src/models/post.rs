//! Blog posts, shown on the public site as articles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, sanitize_html, validate_slug};

/// Post record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub author: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Equality filters for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category_id: Option<i32>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    pub limit: Option<u32>,
}

impl PostFilter {
    pub fn matches(&self, p: &Post) -> bool {
        self.category_id.is_none_or(|id| p.category_id == Some(id))
            && self.is_published.is_none_or(|v| p.is_published == v)
            && self.is_featured.is_none_or(|v| p.is_featured == v)
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePost {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(max = 1000))]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[validate(length(max = 1000))]
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    #[validate(length(max = 255))]
    pub author: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
}

impl CreatePost {
    pub fn into_record(self, slug: String) -> Post {
        let now = Utc::now();
        Post {
            id: 0,
            title: self.title,
            slug,
            excerpt: self.excerpt,
            content: sanitize_html(&self.content),
            image_url: self.image_url,
            category_id: self.category_id,
            author: self.author,
            is_published: self.is_published,
            is_featured: self.is_featured,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for updating a post.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author: Option<Option<String>>,
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_description: Option<Option<String>>,
}

impl UpdatePost {
    pub fn apply(self, p: &mut Post) {
        if let Some(title) = self.title {
            p.title = title;
        }
        if let Some(slug) = self.slug {
            p.slug = slug;
        }
        if let Some(excerpt) = self.excerpt {
            p.excerpt = excerpt;
        }
        if let Some(content) = self.content {
            p.content = sanitize_html(&content);
        }
        if let Some(image_url) = self.image_url {
            p.image_url = image_url;
        }
        if let Some(category_id) = self.category_id {
            p.category_id = category_id;
        }
        if let Some(author) = self.author {
            p.author = author;
        }
        if let Some(is_published) = self.is_published {
            p.is_published = is_published;
        }
        if let Some(is_featured) = self.is_featured {
            p.is_featured = is_featured;
        }
        if let Some(meta_title) = self.meta_title {
            p.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            p.meta_description = meta_description;
        }
        p.updated_at = Utc::now();
    }
}
