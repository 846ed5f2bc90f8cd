//! Newsletter subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::double_option;

/// Subscriber record. Emails are stored lowercased.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriber {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 255))]
    pub name: Option<String>,
}

impl CreateSubscriber {
    pub fn into_record(self) -> Subscriber {
        Subscriber {
            id: 0,
            email: normalize_email(&self.email),
            name: self.name,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriber {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateSubscriber {
    pub fn apply(self, subscriber: &mut Subscriber) {
        if let Some(name) = self.name {
            subscriber.name = name;
        }
        if let Some(is_active) = self.is_active {
            subscriber.is_active = is_active;
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
