//! Menu administration and the public navigation tree.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_sessions::Session;

use super::helpers::{ValidJson, require_permission};
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateMenu, CreateMenuItem, Menu, MenuItem, MenuLocation, UpdateMenu, UpdateMenuItem,
};
use crate::services::MenuStructure;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct StructureQuery {
    location: Option<String>,
}

/// GET /api/menu-structure?location=header
async fn menu_structure(
    State(state): State<AppState>,
    Query(query): Query<StructureQuery>,
) -> AppResult<Json<MenuStructure>> {
    let raw = query
        .location
        .ok_or_else(|| AppError::BadRequest("location parameter is required".to_string()))?;
    let location: MenuLocation = raw
        .parse()
        .map_err(|e: crate::models::ParseEnumError| AppError::BadRequest(e.to_string()))?;

    let structure = state.menus().structure(location).await?;
    Ok(Json(MenuStructure::clone(&structure)))
}

async fn list_menus(State(state): State<AppState>, session: Session) -> AppResult<Json<Vec<Menu>>> {
    require_permission(&state, &session, "menus.view").await?;
    Ok(Json(state.menus().list_menus().await?))
}

async fn get_menu(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Menu>> {
    require_permission(&state, &session, "menus.view").await?;
    Ok(Json(state.menus().get_menu(id).await?))
}

async fn create_menu(
    State(state): State<AppState>,
    session: Session,
    body: ValidJson<CreateMenu>,
) -> AppResult<(StatusCode, Json<Menu>)> {
    require_permission(&state, &session, "menus.create").await?;
    let input = body.parse()?;
    let menu = state.menus().create_menu(input).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

async fn update_menu(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateMenu>,
) -> AppResult<Json<Menu>> {
    require_permission(&state, &session, "menus.edit").await?;
    let patch = body.parse()?;
    Ok(Json(state.menus().update_menu(id, patch).await?))
}

async fn delete_menu(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "menus.delete").await?;
    state.menus().delete_menu(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(state): State<AppState>,
    session: Session,
    Path(menu_id): Path<i32>,
) -> AppResult<Json<Vec<MenuItem>>> {
    require_permission(&state, &session, "menus.view").await?;
    Ok(Json(state.menus().list_items(menu_id).await?))
}

async fn create_item(
    State(state): State<AppState>,
    session: Session,
    Path(menu_id): Path<i32>,
    body: ValidJson<CreateMenuItem>,
) -> AppResult<(StatusCode, Json<MenuItem>)> {
    require_permission(&state, &session, "menus.create").await?;
    let input = body.parse()?;
    let item = state.menus().create_item(menu_id, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<MenuItem>> {
    require_permission(&state, &session, "menus.view").await?;
    Ok(Json(state.menus().get_item(id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateMenuItem>,
) -> AppResult<Json<MenuItem>> {
    require_permission(&state, &session, "menus.edit").await?;
    let patch = body.parse()?;
    Ok(Json(state.menus().update_item(id, patch).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "menus.delete").await?;
    state.menus().delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menu-structure", get(menu_structure))
        .route("/api/menus", get(list_menus).post(create_menu))
        .route(
            "/api/menus/{id}",
            get(get_menu)
                .put(update_menu)
                .patch(update_menu)
                .delete(delete_menu),
        )
        .route("/api/menus/{id}/items", get(list_items).post(create_item))
        .route(
            "/api/menu-items/{id}",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(delete_item),
        )
}
