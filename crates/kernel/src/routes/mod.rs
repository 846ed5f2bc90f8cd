//! HTTP route handlers.
//!
//! One router per resource, merged into the application router by
//! [`build_app`].

pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod media;
pub mod menus;
pub mod metrics;
pub mod pages;
pub mod posts;
pub mod roles;
pub mod scholarships;
pub mod seo;
pub mod site_settings;
pub mod stories;
pub mod subscribers;
pub mod taxonomy;
pub mod users;

use anyhow::Result;
use axum::Router;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::session::{SessionSettings, with_sessions};
use crate::state::AppState;

/// Every route of the service, without sessions or outer layers.
pub fn router(config: &Config) -> Router<AppState> {
    let uploads_url = format!("/{}", config.uploads_url.trim_matches('/'));

    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(menus::router())
        .merge(pages::router())
        .merge(scholarships::router())
        .merge(posts::router())
        .merge(taxonomy::router())
        .merge(stories::router())
        .merge(subscribers::router())
        .merge(seo::router())
        .merge(site_settings::router())
        .merge(media::router(config.max_upload_bytes))
        .merge(admin::router())
        .merge(health::router())
        .merge(metrics::router())
        .nest_service(&uploads_url, ServeDir::new(&config.uploads_dir))
}

/// The application router with request metrics and sessions attached.
pub async fn build_app(state: AppState) -> Result<Router> {
    let config = state.config().clone();
    let settings = SessionSettings::new(
        config.session_expiry_hours,
        config.cookie_secure,
        &config.cookie_same_site,
    );

    let router = router(&config).route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        crate::metrics::track_requests,
    ));
    let router = with_sessions(router, config.redis_url.as_deref(), &settings).await?;

    Ok(router.with_state(state))
}
