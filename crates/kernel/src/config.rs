//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::session::DEFAULT_SESSION_EXPIRY_HOURS;

/// Default upload size limit (10 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, the in-memory backend is used.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for sessions. When None, sessions live in memory.
    pub redis_url: Option<String>,

    /// Session inactivity expiry in hours (default: 24).
    pub session_expiry_hours: i64,

    /// Whether the session cookie carries the Secure attribute (default: true).
    pub cookie_secure: bool,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Path to uploads directory (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /uploads).
    pub uploads_url: String,

    /// Maximum accepted upload size in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,

    /// Username for the bootstrap admin account.
    pub admin_username: Option<String>,

    /// Password for the bootstrap admin account.
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            database_max_connections: 10,
            redis_url: None,
            session_expiry_hours: DEFAULT_SESSION_EXPIRY_HOURS,
            cookie_secure: true,
            cookie_same_site: "lax".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            uploads_dir: PathBuf::from("./uploads"),
            uploads_url: "/uploads".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            admin_username: None,
            admin_password: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = non_empty_var("DATABASE_URL");

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| defaults.database_max_connections.to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url = non_empty_var("REDIS_URL");

        let session_expiry_hours = env::var("SESSION_EXPIRY_HOURS")
            .unwrap_or_else(|_| defaults.session_expiry_hours.to_string())
            .parse()
            .context("SESSION_EXPIRY_HOURS must be a valid integer")?;

        let cookie_secure = match env::var("COOKIE_SECURE") {
            Ok(v) => parse_bool(&v).context("COOKIE_SECURE must be true or false")?,
            Err(_) => defaults.cookie_secure,
        };

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or(defaults.cookie_same_site)
            .to_lowercase();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or(defaults.cors_allowed_origins);

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.uploads_dir);

        let uploads_url = env::var("UPLOADS_URL").unwrap_or(defaults.uploads_url);

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| defaults.max_upload_bytes.to_string())
            .parse()
            .context("MAX_UPLOAD_BYTES must be a valid usize")?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            session_expiry_hours,
            cookie_secure,
            cookie_same_site,
            cors_allowed_origins,
            uploads_dir,
            uploads_url,
            max_upload_bytes,
            admin_username: non_empty_var("ADMIN_USERNAME"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean: {other}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_memory_backends() {
        let config = Config::default();
        assert!(config.database_url.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.session_expiry_hours, 24);
        assert_eq!(config.uploads_url, "/uploads");
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool(" on ").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
