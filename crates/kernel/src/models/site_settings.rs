//! Site-wide branding and homepage section toggles.
//!
//! A singleton: there is at most one row, created on the first update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::{double_option, validate_color};

/// Site settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub id: i32,
    pub site_name: String,
    pub site_tagline: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub contact_email: Option<String>,
    pub footer_text: Option<String>,
    pub show_featured_scholarships: bool,
    pub show_latest_posts: bool,
    pub show_success_stories: bool,
    pub show_newsletter: bool,
    pub show_categories: bool,
    pub updated_at: DateTime<Utc>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            id: 0,
            site_name: "Scholaris".to_string(),
            site_tagline: None,
            logo_url: None,
            favicon_url: None,
            primary_color: "#1a73e8".to_string(),
            secondary_color: "#0f172a".to_string(),
            accent_color: "#f59e0b".to_string(),
            contact_email: None,
            footer_text: None,
            show_featured_scholarships: true,
            show_latest_posts: true,
            show_success_stories: true,
            show_newsletter: true,
            show_categories: true,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update applied by the upsert.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteSettings {
    #[validate(length(min = 1, max = 255))]
    pub site_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub site_tagline: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub favicon_url: Option<Option<String>>,
    #[validate(custom(function = "validate_color"))]
    pub primary_color: Option<String>,
    #[validate(custom(function = "validate_color"))]
    pub secondary_color: Option<String>,
    #[validate(custom(function = "validate_color"))]
    pub accent_color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub footer_text: Option<Option<String>>,
    pub show_featured_scholarships: Option<bool>,
    pub show_latest_posts: Option<bool>,
    pub show_success_stories: Option<bool>,
    pub show_newsletter: Option<bool>,
    pub show_categories: Option<bool>,
}

impl UpdateSiteSettings {
    pub fn apply(self, s: &mut SiteSettings) {
        if let Some(site_name) = self.site_name {
            s.site_name = site_name;
        }
        if let Some(site_tagline) = self.site_tagline {
            s.site_tagline = site_tagline;
        }
        if let Some(logo_url) = self.logo_url {
            s.logo_url = logo_url;
        }
        if let Some(favicon_url) = self.favicon_url {
            s.favicon_url = favicon_url;
        }
        if let Some(primary_color) = self.primary_color {
            s.primary_color = primary_color;
        }
        if let Some(secondary_color) = self.secondary_color {
            s.secondary_color = secondary_color;
        }
        if let Some(accent_color) = self.accent_color {
            s.accent_color = accent_color;
        }
        if let Some(contact_email) = self.contact_email {
            s.contact_email = contact_email;
        }
        if let Some(footer_text) = self.footer_text {
            s.footer_text = footer_text;
        }
        if let Some(v) = self.show_featured_scholarships {
            s.show_featured_scholarships = v;
        }
        if let Some(v) = self.show_latest_posts {
            s.show_latest_posts = v;
        }
        if let Some(v) = self.show_success_stories {
            s.show_success_stories = v;
        }
        if let Some(v) = self.show_newsletter {
            s.show_newsletter = v;
        }
        if let Some(v) = self.show_categories {
            s.show_categories = v;
        }
        s.updated_at = Utc::now();
    }
}
