//! Session management.
//!
//! Sessions live in process memory by default. When `REDIS_URL` is configured
//! they are stored in Redis instead so they survive restarts.

use anyhow::{Context, Result};
use axum::Router;
use fred::prelude::*;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_redis_store::RedisStore;
use tracing::info;

/// Default session expiry (24 hours).
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Cookie attributes shared by every session backend.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub expiry_hours: i64,
    pub secure: bool,
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Build settings from the raw configuration values.
    pub fn new(expiry_hours: i64, secure: bool, same_site: &str) -> Self {
        let same_site = match same_site {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        };

        Self {
            expiry_hours,
            secure,
            same_site,
        }
    }
}

fn configure<S: SessionStore>(store: S, settings: &SessionSettings) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_secure(settings.secure)
        .with_http_only(true)
        .with_same_site(settings.same_site)
        .with_expiry(Expiry::OnInactivity(Duration::hours(settings.expiry_hours)))
}

/// Create a session layer backed by process memory.
pub fn memory_session_layer(settings: &SessionSettings) -> SessionManagerLayer<MemoryStore> {
    configure(MemoryStore::default(), settings)
}

/// Create a session layer using Redis as the backend.
pub async fn redis_session_layer(
    redis_url: &str,
    settings: &SessionSettings,
) -> Result<SessionManagerLayer<RedisStore<Pool>>> {
    let config = fred::prelude::Config::from_url(redis_url).context("failed to parse Redis URL")?;

    let pool = Builder::from_config(config)
        .build_pool(1)
        .context("failed to create Redis pool")?;

    pool.init()
        .await
        .context("failed to connect to Redis for sessions")?;

    Ok(configure(RedisStore::new(pool), settings))
}

/// Wrap `router` in the session layer selected by configuration.
pub async fn with_sessions<S>(
    router: Router<S>,
    redis_url: Option<&str>,
    settings: &SessionSettings,
) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    match redis_url {
        Some(url) => {
            let layer = redis_session_layer(url, settings).await?;
            info!("sessions stored in Redis");
            Ok(router.layer(layer))
        }
        None => {
            info!("sessions stored in memory");
            Ok(router.layer(memory_session_layer(settings)))
        }
    }
}
