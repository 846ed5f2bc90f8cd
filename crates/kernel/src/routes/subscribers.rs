//! Newsletter subscriber routes. Signing up is public; everything else is
//! administrative.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{ValidJson, require_permission};
use crate::error::{AppError, AppResult};
use crate::models::subscriber::normalize_email;
use crate::models::{CreateSubscriber, Subscriber, UpdateSubscriber};
use crate::state::AppState;

/// POST /api/subscribers
///
/// A returning subscriber who had unsubscribed is re-activated (200); an
/// address that is already active is rejected.
async fn subscribe(
    State(state): State<AppState>,
    body: ValidJson<CreateSubscriber>,
) -> AppResult<(StatusCode, Json<Subscriber>)> {
    let input = body.parse()?;
    let email = normalize_email(&input.email);

    match state.storage().get_subscriber_by_email(&email).await? {
        Some(existing) if existing.is_active => Err(AppError::BadRequest(
            "this email is already subscribed".to_string(),
        )),
        Some(mut existing) => {
            existing.is_active = true;
            if input.name.is_some() {
                existing.name = input.name;
            }
            let subscriber = state
                .storage()
                .update_subscriber(existing)
                .await?
                .ok_or_else(|| AppError::not_found("subscriber"))?;
            info!(subscriber_id = subscriber.id, "subscriber re-activated");
            Ok((StatusCode::OK, Json(subscriber)))
        }
        None => {
            let subscriber = state
                .storage()
                .insert_subscriber(input.into_record())
                .await?;
            info!(subscriber_id = subscriber.id, "subscriber added");
            Ok((StatusCode::CREATED, Json(subscriber)))
        }
    }
}

async fn list_subscribers(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Vec<Subscriber>>> {
    require_permission(&state, &session, "subscribers.view").await?;
    Ok(Json(state.storage().list_subscribers().await?))
}

async fn get_subscriber(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Subscriber>> {
    require_permission(&state, &session, "subscribers.view").await?;
    let subscriber = state
        .storage()
        .get_subscriber(id)
        .await?
        .ok_or_else(|| AppError::not_found("subscriber"))?;
    Ok(Json(subscriber))
}

async fn update_subscriber(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateSubscriber>,
) -> AppResult<Json<Subscriber>> {
    require_permission(&state, &session, "subscribers.edit").await?;
    let patch = body.parse()?;
    let mut subscriber = state
        .storage()
        .get_subscriber(id)
        .await?
        .ok_or_else(|| AppError::not_found("subscriber"))?;
    patch.apply(&mut subscriber);
    let subscriber = state
        .storage()
        .update_subscriber(subscriber)
        .await?
        .ok_or_else(|| AppError::not_found("subscriber"))?;
    info!(subscriber_id = id, active = subscriber.is_active, "subscriber updated");
    Ok(Json(subscriber))
}

async fn delete_subscriber(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "subscribers.delete").await?;
    if !state.storage().delete_subscriber(id).await? {
        return Err(AppError::not_found("subscriber"));
    }
    info!(subscriber_id = id, "subscriber deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/subscribers", get(list_subscribers).post(subscribe))
        .route(
            "/api/subscribers/{id}",
            get(get_subscriber)
                .put(update_subscriber)
                .patch(update_subscriber)
                .delete(delete_subscriber),
        )
}
