//! Role administration and the permission catalog.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_sessions::Session;

use super::helpers::{ValidJson, require_permission};
use crate::error::AppResult;
use crate::models::{CreateRole, Role, UpdateRole};
use crate::permissions::{CATALOG, PermissionGroup};
use crate::state::AppState;

async fn list_roles(State(state): State<AppState>, session: Session) -> AppResult<Json<Vec<Role>>> {
    require_permission(&state, &session, "roles.view").await?;
    Ok(Json(state.roles().list().await?))
}

async fn get_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Role>> {
    require_permission(&state, &session, "roles.view").await?;
    Ok(Json(state.roles().get(id).await?))
}

async fn create_role(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateRole>,
) -> AppResult<(StatusCode, Json<Role>)> {
    require_permission(&state, &session, "roles.create").await?;
    let input = body.parse()?;
    let role = state.roles().create(input).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

async fn update_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateRole>,
) -> AppResult<Json<Role>> {
    require_permission(&state, &session, "roles.edit").await?;
    let patch = body.parse()?;
    Ok(Json(state.roles().update(id, patch).await?))
}

async fn delete_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "roles.delete").await?;
    state.roles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Role>> {
    require_permission(&state, &session, "roles.edit").await?;
    Ok(Json(state.roles().set_default(id).await?))
}

/// GET /api/permissions
async fn list_permissions(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<&'static [PermissionGroup]>> {
    require_permission(&state, &session, "roles.view").await?;
    Ok(Json(CATALOG))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/roles", get(list_roles).post(create_role))
        .route(
            "/api/roles/{id}",
            get(get_role)
                .put(update_role)
                .patch(update_role)
                .delete(delete_role),
        )
        .route("/api/roles/{id}/default", post(set_default_role))
        .route("/api/permissions", get(list_permissions))
}
