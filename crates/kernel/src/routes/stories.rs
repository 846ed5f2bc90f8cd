//! Success story routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{PublishedQuery, ValidJson, ensure_visible, published_filter, require_permission};
use crate::error::{AppError, AppResult};
use crate::models::{CreateSuccessStory, SuccessStory, UpdateSuccessStory};
use crate::state::AppState;
use crate::storage::ListFilter;

const AREA: &str = "success_stories";

async fn list_stories(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PublishedQuery>,
) -> AppResult<Json<Vec<SuccessStory>>> {
    let filter = ListFilter {
        is_published: published_filter(&state, &session, AREA, query.published).await?,
        limit: query.limit,
    };
    Ok(Json(state.storage().list_stories(filter).await?))
}

async fn get_story(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<SuccessStory>> {
    let story = state
        .storage()
        .get_story(id)
        .await?
        .ok_or_else(|| AppError::not_found("success story"))?;
    ensure_visible(&state, &session, AREA, story.is_published).await?;
    Ok(Json(story))
}

async fn create_story(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateSuccessStory>,
) -> AppResult<(StatusCode, Json<SuccessStory>)> {
    require_permission(&state, &session, "success_stories.create").await?;
    let input = body.parse()?;
    let story = state.storage().insert_story(input.into_record()).await?;
    info!(story_id = story.id, "success story created");
    Ok((StatusCode::CREATED, Json(story)))
}

async fn update_story(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateSuccessStory>,
) -> AppResult<Json<SuccessStory>> {
    require_permission(&state, &session, "success_stories.edit").await?;
    let patch = body.parse()?;
    let mut story = state
        .storage()
        .get_story(id)
        .await?
        .ok_or_else(|| AppError::not_found("success story"))?;
    patch.apply(&mut story);
    let story = state
        .storage()
        .update_story(story)
        .await?
        .ok_or_else(|| AppError::not_found("success story"))?;
    info!(story_id = id, "success story updated");
    Ok(Json(story))
}

async fn delete_story(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "success_stories.delete").await?;
    if !state.storage().delete_story(id).await? {
        return Err(AppError::not_found("success story"));
    }
    info!(story_id = id, "success story deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/success-stories", get(list_stories).post(create_story))
        .route(
            "/api/success-stories/{id}",
            get(get_story)
                .put(update_story)
                .patch(update_story)
                .delete(delete_story),
        )
}
