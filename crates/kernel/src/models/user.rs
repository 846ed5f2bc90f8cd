//! User accounts and password hashing.

use anyhow::Result;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validate::double_option;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Explicit role. When None the default role applies.
    pub role_id: Option<i32>,
    /// Superusers pass every permission check.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role_id: Option<i32>,
    #[serde(default)]
    pub is_admin: bool,
}

impl CreateUser {
    /// Hash the password and build the record.
    pub fn into_record(self) -> Result<User> {
        let now = Utc::now();
        Ok(User {
            id: 0,
            username: self.username.trim().to_string(),
            email: self.email,
            password_hash: hash_password(&self.password)?,
            role_id: self.role_id,
            is_admin: self.is_admin,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Input for updating a user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

impl UpdateUser {
    pub fn apply(self, user: &mut User) -> Result<()> {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password_hash = hash_password(&password)?;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Utc::now();
        Ok(())
    }
}

impl User {
    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.password_hash.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.password_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
