//! Uploaded media files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::double_option;

/// Media record. The file itself lives in the upload storage under `filename`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i32,
    /// Generated storage name.
    pub filename: String,
    /// Name supplied by the uploader.
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    /// Public URL the file is served from.
    pub url: String,
    pub alt_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedia {
    #[serde(default, deserialize_with = "double_option")]
    pub alt_text: Option<Option<String>>,
}

impl UpdateMedia {
    pub fn apply(self, media: &mut Media) {
        if let Some(alt_text) = self.alt_text {
            media.alt_text = alt_text;
        }
    }
}
