//! Per-path SEO override routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use super::helpers::{ValidJson, require_permission};
use crate::error::{AppError, AppResult};
use crate::models::{CreateSeoSetting, SeoSetting, UpdateSeoSetting};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SeoQuery {
    path: Option<String>,
}

async fn ensure_path_free(state: &AppState, path: &str, own_id: Option<i32>) -> AppResult<()> {
    match state.storage().get_seo_by_path(path).await? {
        Some(existing) if Some(existing.id) != own_id => Err(AppError::BadRequest(format!(
            "SEO settings for '{path}' already exist"
        ))),
        _ => Ok(()),
    }
}

/// GET /api/seo-settings
///
/// With `?path=` this is the public lookup the site renders from; without
/// it, the administrative list.
async fn list_or_lookup(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SeoQuery>,
) -> AppResult<Response> {
    if let Some(path) = query.path {
        let seo = state
            .storage()
            .get_seo_by_path(&path)
            .await?
            .ok_or_else(|| AppError::not_found("SEO settings"))?;
        return Ok(Json(seo).into_response());
    }

    require_permission(&state, &session, "seo.view").await?;
    Ok(Json(state.storage().list_seo().await?).into_response())
}

async fn get_seo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<SeoSetting>> {
    require_permission(&state, &session, "seo.view").await?;
    let seo = state
        .storage()
        .get_seo(id)
        .await?
        .ok_or_else(|| AppError::not_found("SEO settings"))?;
    Ok(Json(seo))
}

async fn create_seo(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateSeoSetting>,
) -> AppResult<(StatusCode, Json<SeoSetting>)> {
    require_permission(&state, &session, "seo.manage").await?;
    let input = body.parse()?;
    ensure_path_free(&state, &input.page_path, None).await?;
    let seo = state.storage().insert_seo(input.into_record()).await?;
    info!(seo_id = seo.id, path = %seo.page_path, "SEO settings created");
    Ok((StatusCode::CREATED, Json(seo)))
}

async fn update_seo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateSeoSetting>,
) -> AppResult<Json<SeoSetting>> {
    require_permission(&state, &session, "seo.manage").await?;
    let patch = body.parse()?;
    let mut seo = state
        .storage()
        .get_seo(id)
        .await?
        .ok_or_else(|| AppError::not_found("SEO settings"))?;
    if let Some(path) = &patch.page_path {
        ensure_path_free(&state, path, Some(id)).await?;
    }
    patch.apply(&mut seo);
    let seo = state
        .storage()
        .update_seo(seo)
        .await?
        .ok_or_else(|| AppError::not_found("SEO settings"))?;
    info!(seo_id = id, path = %seo.page_path, "SEO settings updated");
    Ok(Json(seo))
}

async fn delete_seo(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "seo.manage").await?;
    if !state.storage().delete_seo(id).await? {
        return Err(AppError::not_found("SEO settings"));
    }
    info!(seo_id = id, "SEO settings deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/seo-settings", get(list_or_lookup).post(create_seo))
        .route(
            "/api/seo-settings/{id}",
            get(get_seo)
                .put(update_seo)
                .patch(update_seo)
                .delete(delete_seo),
        )
}
