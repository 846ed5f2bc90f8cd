//! Authentication routes (login, logout, current user).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, warn};
use validator::Validate;

use super::helpers::{SESSION_USER_ID, ValidJson, require_login};
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// A user together with the permissions they effectively hold.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: User,
    pub permissions: Vec<String>,
}

async fn current_user_with_permissions(state: &AppState, user: User) -> AppResult<CurrentUser> {
    let mut permissions: Vec<String> = state
        .permissions()
        .effective_permissions(&user)
        .await?
        .iter()
        .cloned()
        .collect();
    permissions.sort();
    Ok(CurrentUser { user, permissions })
}

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<LoginRequest>,
) -> AppResult<Json<CurrentUser>> {
    let request = body.parse()?;
    let username = request.username.trim();

    if state.lockout().is_locked(username) {
        return Err(AppError::TooManyRequests(
            "account temporarily locked; try again later".to_string(),
        ));
    }

    let user = state.storage().get_user_by_username(username).await?;
    let Some(user) = user.filter(|u| u.verify_password(&request.password)) else {
        state.metrics().record_login_failure();
        let (locked, remaining) = state.lockout().record_failed_attempt(username);
        warn!(username = %username, remaining, locked, "failed login");
        if locked {
            return Err(AppError::TooManyRequests(
                "account temporarily locked due to too many failed attempts".to_string(),
            ));
        }
        return Err(AppError::Unauthorized);
    };

    state.lockout().clear_attempts(username);

    session
        .cycle_id()
        .await
        .map_err(|e| anyhow::anyhow!("failed to cycle session id: {e}"))?;
    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store user in session: {e}"))?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(current_user_with_permissions(&state, user).await?))
}

/// POST /api/logout
async fn logout(session: Session) -> AppResult<StatusCode> {
    let user_id: Option<i32> = session.get(SESSION_USER_ID).await.ok().flatten();
    session
        .flush()
        .await
        .map_err(|e| anyhow::anyhow!("failed to clear session: {e}"))?;
    if let Some(user_id) = user_id {
        info!(user_id, "user logged out");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/user
async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<CurrentUser>> {
    let user = require_login(&state, &session).await?;
    Ok(Json(current_user_with_permissions(&state, user).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(me))
}
