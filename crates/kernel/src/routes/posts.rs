//! Post (article) routes.

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
use crate::models::{CreatePost, Post, PostFilter, UpdatePost};
use crate::state::AppState;

const AREA: &str = "posts";

#[derive(Debug, Default, Deserialize)]
struct PostQuery {
    category: Option<i32>,
    featured: Option<bool>,
    published: Option<bool>,
    limit: Option<u32>,
}

async fn list_posts(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PostQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let filter = PostFilter {
        category_id: query.category,
        is_featured: query.featured,
        is_published: published_filter(&state, &session, AREA, query.published).await?,
        limit: query.limit,
    };
    Ok(Json(state.storage().list_posts(&filter).await?))
}

async fn get_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Post>> {
    let post = state
        .storage()
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    ensure_visible(&state, &session, AREA, post.is_published).await?;
    Ok(Json(post))
}

async fn get_post_by_slug(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<Post>> {
    let post = state
        .storage()
        .get_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    ensure_visible(&state, &session, AREA, post.is_published).await?;
    Ok(Json(post))
}

async fn create_post(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreatePost>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let user = require_permission(&state, &session, "posts.create").await?;
    let input = body.parse()?;

    let slug = slug_or_derive(input.slug.clone(), &input.title)?;
    let existing = state.storage().get_post_by_slug(&slug).await?;
    ensure_slug_free(existing.map(|p| p.id), None, &slug)?;

    let mut post = input.into_record(slug);
    if post.author.is_none() {
        post.author = Some(user.username.clone());
    }
    let post = state.storage().insert_post(post).await?;
    state.menus().invalidate();
    info!(post_id = post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdatePost>,
) -> AppResult<Json<Post>> {
    require_permission(&state, &session, "posts.edit").await?;
    let patch = body.parse()?;

    let mut post = state
        .storage()
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    if let Some(slug) = &patch.slug {
        let existing = state.storage().get_post_by_slug(slug).await?;
        ensure_slug_free(existing.map(|p| p.id), Some(id), slug)?;
    }

    patch.apply(&mut post);
    let post = state
        .storage()
        .update_post(post)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    state.menus().invalidate();
    info!(post_id = id, "post updated");
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "posts.delete").await?;
    if !state.storage().delete_post(id).await? {
        return Err(AppError::not_found("post"));
    }
    state.menus().invalidate();
    info!(post_id = id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post)
                .put(update_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route("/api/posts/slug/{slug}", get(get_post_by_slug))
}
