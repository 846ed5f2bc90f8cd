//! Dashboard statistics.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;

use super::helpers::require_permission;
use crate::error::AppResult;
use crate::models::EntityCounts;
use crate::state::AppState;

/// GET /api/admin/stats
async fn stats(State(state): State<AppState>, session: Session) -> AppResult<Json<EntityCounts>> {
    require_permission(&state, &session, "dashboard.view").await?;
    Ok(Json(state.storage().counts().await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/stats", get(stats))
}
