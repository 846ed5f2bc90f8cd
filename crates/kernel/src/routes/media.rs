//! Media library routes.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use tracing::{info, warn};

use super::helpers::{ValidJson, require_permission};
use crate::error::{AppError, AppResult};
use crate::file::Upload;
use crate::models::{Media, UpdateMedia};
use crate::state::AppState;

/// Room for the multipart framing and the text fields around the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// POST /api/media
///
/// Form fields:
/// - file: the file to upload
/// - altText: optional alternative text
async fn upload_media(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Media>)> {
    let user = require_permission(&state, &session, "media.upload").await?;

    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut alt_text: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if file.is_none() => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    warn!(error = %e, "failed to read upload data");
                    AppError::BadRequest("failed to read file data".to_string())
                })?;
                file = Some((filename, content_type, data.to_vec()));
            }
            "altText" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid altText field: {e}")))?;
                alt_text = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let Some((filename, content_type, data)) = file else {
        return Err(AppError::BadRequest("no file provided".to_string()));
    };

    let media = state
        .files()
        .upload(Upload {
            original_name: &filename,
            declared_mime: content_type.as_deref(),
            data: &data,
            alt_text,
        })
        .await?;
    state.metrics().record_upload(media.size as u64);
    info!(media_id = media.id, uploaded_by = user.id, "media uploaded");
    Ok((StatusCode::CREATED, Json(media)))
}

async fn list_media(State(state): State<AppState>, session: Session) -> AppResult<Json<Vec<Media>>> {
    require_permission(&state, &session, "media.view").await?;
    Ok(Json(state.storage().list_media().await?))
}

async fn get_media(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<Json<Media>> {
    require_permission(&state, &session, "media.view").await?;
    let media = state
        .storage()
        .get_media(id)
        .await?
        .ok_or_else(|| AppError::not_found("media"))?;
    Ok(Json(media))
}

async fn update_media(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: ValidJson<UpdateMedia>,
) -> AppResult<Json<Media>> {
    require_permission(&state, &session, "media.edit").await?;
    let patch = body.parse()?;
    let mut media = state
        .storage()
        .get_media(id)
        .await?
        .ok_or_else(|| AppError::not_found("media"))?;
    patch.apply(&mut media);
    let media = state
        .storage()
        .update_media(media)
        .await?
        .ok_or_else(|| AppError::not_found("media"))?;
    Ok(Json(media))
}

async fn delete_media(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, "media.delete").await?;
    state.files().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Media routes; request bodies may be up to `max_upload_bytes` plus
/// multipart overhead.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/api/media",
            get(list_media)
                .post(upload_media)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route(
            "/api/media/{id}",
            get(get_media)
                .put(update_media)
                .patch(update_media)
                .delete(delete_media),
        )
}
