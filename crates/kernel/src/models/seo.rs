//! Per-path SEO overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, validate_path};

/// SEO setting record, keyed by site path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SeoSetting {
    pub id: i32,
    pub page_path: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeoSetting {
    #[validate(length(max = 500), custom(function = "validate_path"))]
    pub page_path: String,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,
    #[validate(length(max = 1000))]
    pub og_image: Option<String>,
    #[validate(url)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

impl CreateSeoSetting {
    pub fn into_record(self) -> SeoSetting {
        let now = Utc::now();
        SeoSetting {
            id: 0,
            page_path: self.page_path,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            meta_keywords: self.meta_keywords,
            og_image: self.og_image,
            canonical_url: self.canonical_url,
            no_index: self.no_index,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSeoSetting {
    #[validate(length(max = 500), custom(function = "validate_path"))]
    pub page_path: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta_keywords: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub og_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub canonical_url: Option<Option<String>>,
    pub no_index: Option<bool>,
}

impl UpdateSeoSetting {
    pub fn apply(self, seo: &mut SeoSetting) {
        if let Some(page_path) = self.page_path {
            seo.page_path = page_path;
        }
        if let Some(meta_title) = self.meta_title {
            seo.meta_title = meta_title;
        }
        if let Some(meta_description) = self.meta_description {
            seo.meta_description = meta_description;
        }
        if let Some(meta_keywords) = self.meta_keywords {
            seo.meta_keywords = meta_keywords;
        }
        if let Some(og_image) = self.og_image {
            seo.og_image = og_image;
        }
        if let Some(canonical_url) = self.canonical_url {
            seo.canonical_url = canonical_url;
        }
        if let Some(no_index) = self.no_index {
            seo.no_index = no_index;
        }
        seo.updated_at = Utc::now();
    }
}
