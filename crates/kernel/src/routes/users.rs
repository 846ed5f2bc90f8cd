//! User administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;
use validator::Validate;

use super::helpers::{ValidJson, require_permission};
use crate::error::{AppError, AppResult};
use crate::models::{CreateUser, UpdateUser, User};
use crate::state::AppState;

/// Body of `PUT /api/users/{id}/role`. A null role clears the assignment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRole {
    pub role_id: Option<i32>,
}

async fn list_users(State(state): State<AppState>, session: Session) -> AppResult<Json<Vec<User>>> {
    require_permission(&state, &session, "users.view").await?;
    Ok(Json(state.storage().list_users().await?))
}

async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    require_permission(&state, &session, "users.view").await?;
    let user = state
        .storage()
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(Json(user))
}

async fn create_user(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let actor = require_permission(&state, &session, "users.create").await?;
    let input = body.parse()?;

    if input.is_admin && !actor.is_admin {
        return Err(AppError::Forbidden(
            "only administrators can create administrators".to_string(),
        ));
    }
    if state
        .storage()
        .get_user_by_username(input.username.trim())
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(format!(
            "username '{}' is already taken",
            input.username.trim()
        )));
    }
    if let Some(role_id) = input.role_id {
        state.roles().get(role_id).await?;
    }

    let user = state.storage().insert_user(input.into_record()?).await?;
    info!(user_id = user.id, username = %user.username, created_by = actor.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Load the user `actor` is about to change. Administrator accounts are
/// only managed by administrators.
async fn load_managed_user(state: &AppState, actor: &User, id: i32) -> AppResult<User> {
    let target = state
        .storage()
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    if target.is_admin && !actor.is_admin {
        return Err(AppError::Forbidden(
            "only administrators can modify administrator accounts".to_string(),
        ));
    }
    Ok(target)
}

async fn update_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateUser>,
) -> AppResult<Json<User>> {
    let actor = require_permission(&state, &session, "users.edit").await?;
    let patch = body.parse()?;
    if patch.is_admin.is_some() && !actor.is_admin {
        return Err(AppError::Forbidden(
            "only administrators can change the administrator flag".to_string(),
        ));
    }

    let mut user = load_managed_user(&state, &actor, id).await?;
    patch.apply(&mut user)?;
    let user = state
        .storage()
        .update_user(user)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    state.permissions().invalidate_user(id);
    info!(user_id = id, updated_by = actor.id, "user updated");
    Ok(Json(user))
}

async fn assign_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<AssignRole>,
) -> AppResult<Json<User>> {
    let actor = require_permission(&state, &session, "users.edit").await?;
    let body = body.parse()?;
    load_managed_user(&state, &actor, id).await?;
    Ok(Json(state.roles().assign(id, body.role_id).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let actor = require_permission(&state, &session, "users.delete").await?;
    if actor.id == id {
        return Err(AppError::BadRequest(
            "you cannot delete your own account".to_string(),
        ));
    }
    load_managed_user(&state, &actor, id).await?;
    if !state.storage().delete_user(id).await? {
        return Err(AppError::not_found("user"));
    }

    state.permissions().invalidate_user(id);
    info!(user_id = id, deleted_by = actor.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/users/{id}/role", put(assign_role))
}
