//! Site settings routes. Reading is public; saving is an upsert.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;

use super::helpers::{ValidJson, require_permission};
use crate::error::AppResult;
use crate::models::{SiteSettings, UpdateSiteSettings};
use crate::state::AppState;

/// GET /api/site-settings
async fn get_settings(State(state): State<AppState>) -> AppResult<Json<SiteSettings>> {
    Ok(Json(state.settings().get().await?))
}

/// PUT/PATCH /api/site-settings
async fn save_settings(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<UpdateSiteSettings>,
) -> AppResult<Json<SiteSettings>> {
    require_permission(&state, &session, "settings.edit").await?;
    let patch = body.parse()?;
    Ok(Json(state.settings().update(patch).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/site-settings",
        get(get_settings).put(save_settings).patch(save_settings),
    )
}
