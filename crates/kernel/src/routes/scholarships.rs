//! Scholarship listing routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use super::helpers::{
    ValidJson, ensure_slug_free, ensure_visible, published_filter, require_permission,
    slug_or_derive,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateScholarship, Scholarship, ScholarshipFilter, UpdateScholarship};
use crate::state::AppState;

const AREA: &str = "scholarships";

#[derive(Debug, Default, Deserialize)]
struct ScholarshipQuery {
    category: Option<i32>,
    level: Option<i32>,
    country: Option<i32>,
    featured: Option<bool>,
    published: Option<bool>,
    limit: Option<u32>,
}

async fn list_scholarships(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ScholarshipQuery>,
) -> AppResult<Json<Vec<Scholarship>>> {
    let filter = ScholarshipFilter {
        category_id: query.category,
        level_id: query.level,
        country_id: query.country,
        is_featured: query.featured,
        is_published: published_filter(&state, &session, AREA, query.published).await?,
        limit: query.limit,
    };
    Ok(Json(state.storage().list_scholarships(&filter).await?))
}

async fn get_scholarship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Scholarship>> {
    let scholarship = state
        .storage()
        .get_scholarship(id)
        .await?
        .ok_or_else(|| AppError::not_found("scholarship"))?;
    ensure_visible(&state, &session, AREA, scholarship.is_published).await?;
    Ok(Json(scholarship))
}

async fn get_scholarship_by_slug(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<Scholarship>> {
    let scholarship = state
        .storage()
        .get_scholarship_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("scholarship"))?;
    ensure_visible(&state, &session, AREA, scholarship.is_published).await?;
    Ok(Json(scholarship))
}

async fn create_scholarship(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateScholarship>,
) -> AppResult<(StatusCode, Json<Scholarship>)> {
    require_permission(&state, &session, "scholarships.create").await?;
    let input = body.parse()?;

    let slug = slug_or_derive(input.slug.clone(), &input.title)?;
    let existing = state.storage().get_scholarship_by_slug(&slug).await?;
    ensure_slug_free(existing.map(|s| s.id), None, &slug)?;

    let scholarship = state
        .storage()
        .insert_scholarship(input.into_record(slug))
        .await?;
    state.menus().invalidate();
    info!(scholarship_id = scholarship.id, slug = %scholarship.slug, "scholarship created");
    Ok((StatusCode::CREATED, Json(scholarship)))
}

async fn update_scholarship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateScholarship>,
) -> AppResult<Json<Scholarship>> {
    require_permission(&state, &session, "scholarships.edit").await?;
    let patch = body.parse()?;

    let mut scholarship = state
        .storage()
        .get_scholarship(id)
        .await?
        .ok_or_else(|| AppError::not_found("scholarship"))?;
    if let Some(slug) = &patch.slug {
        let existing = state.storage().get_scholarship_by_slug(slug).await?;
        ensure_slug_free(existing.map(|s| s.id), Some(id), slug)?;
    }

    patch.apply(&mut scholarship);
    let scholarship = state
        .storage()
        .update_scholarship(scholarship)
        .await?
        .ok_or_else(|| AppError::not_found("scholarship"))?;
    state.menus().invalidate();
    info!(scholarship_id = id, "scholarship updated");
    Ok(Json(scholarship))
}

async fn delete_scholarship(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "scholarships.delete").await?;
    if !state.storage().delete_scholarship(id).await? {
        return Err(AppError::not_found("scholarship"));
    }
    state.menus().invalidate();
    info!(scholarship_id = id, "scholarship deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/scholarships",
            get(list_scholarships).post(create_scholarship),
        )
        .route(
            "/api/scholarships/{id}",
            get(get_scholarship)
                .put(update_scholarship)
                .patch(update_scholarship)
                .delete(delete_scholarship),
        )
        .route(
            "/api/scholarships/slug/{slug}",
            get(get_scholarship_by_slug),
        )
}
