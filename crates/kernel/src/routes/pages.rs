//! Static page routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{
    PublishedQuery, ValidJson, ensure_slug_free, ensure_visible, published_filter,
    require_permission, slug_or_derive,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreatePage, Page, UpdatePage, User};
use crate::state::AppState;
use crate::storage::ListFilter;

const AREA: &str = "pages";

/// Header and footer placement needs `pages.manage` on top of the write
/// permission.
async fn check_placement(state: &AppState, user: &User, placing: bool) -> AppResult<()> {
    if placing
        && !state
            .permissions()
            .user_has_permission(user, "pages.manage")
            .await?
    {
        return Err(AppError::Forbidden(
            "placing pages in the header or footer requires pages.manage".to_string(),
        ));
    }
    Ok(())
}

async fn list_pages(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PublishedQuery>,
) -> AppResult<Json<Vec<Page>>> {
    let filter = ListFilter {
        is_published: published_filter(&state, &session, AREA, query.published).await?,
        limit: query.limit,
    };
    Ok(Json(state.storage().list_pages(filter).await?))
}

async fn get_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Page>> {
    let page = state
        .storage()
        .get_page(id)
        .await?
        .ok_or_else(|| AppError::not_found("page"))?;
    ensure_visible(&state, &session, AREA, page.is_published).await?;
    Ok(Json(page))
}

async fn get_page_by_slug(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> AppResult<Json<Page>> {
    let page = state
        .storage()
        .get_page_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("page"))?;
    ensure_visible(&state, &session, AREA, page.is_published).await?;
    Ok(Json(page))
}

async fn create_page(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreatePage>,
) -> AppResult<(StatusCode, Json<Page>)> {
    let user = require_permission(&state, &session, "pages.create").await?;
    let input = body.parse()?;
    check_placement(&state, &user, input.show_in_header || input.show_in_footer).await?;

    let slug = slug_or_derive(input.slug.clone(), &input.title)?;
    let existing = state.storage().get_page_by_slug(&slug).await?;
    ensure_slug_free(existing.map(|p| p.id), None, &slug)?;

    let page = state.storage().insert_page(input.into_record(slug)).await?;
    state.menus().invalidate();
    info!(page_id = page.id, slug = %page.slug, "page created");
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdatePage>,
) -> AppResult<Json<Page>> {
    let user = require_permission(&state, &session, "pages.edit").await?;
    let patch = body.parse()?;
    check_placement(
        &state,
        &user,
        patch.show_in_header.is_some() || patch.show_in_footer.is_some(),
    )
    .await?;

    let mut page = state
        .storage()
        .get_page(id)
        .await?
        .ok_or_else(|| AppError::not_found("page"))?;
    if let Some(slug) = &patch.slug {
        let existing = state.storage().get_page_by_slug(slug).await?;
        ensure_slug_free(existing.map(|p| p.id), Some(id), slug)?;
    }

    patch.apply(&mut page);
    let page = state
        .storage()
        .update_page(page)
        .await?
        .ok_or_else(|| AppError::not_found("page"))?;
    state.menus().invalidate();
    info!(page_id = id, published = page.is_published, "page updated");
    Ok(Json(page))
}

async fn delete_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "pages.delete").await?;
    if !state.storage().delete_page(id).await? {
        return Err(AppError::not_found("page"));
    }
    state.menus().invalidate();
    info!(page_id = id, "page deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pages", get(list_pages).post(create_page))
        .route(
            "/api/pages/{id}",
            get(get_page)
                .put(update_page)
                .patch(update_page)
                .delete(delete_page),
        )
        .route("/api/pages/slug/{slug}", get(get_page_by_slug))
}
