//! Taxonomy routes. Every vocabulary gets the same set of endpoints under
//! `/api/{table}`, e.g. `/api/categories` and `/api/countries/slug/{slug}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_sessions::Session;
use tracing::info;

use super::helpers::{ValidJson, ensure_slug_free, require_permission, slug_or_derive};
use crate::error::{AppError, AppResult};
use crate::models::{CreateTerm, Term, TermKind, UpdateTerm};
use crate::state::AppState;

fn permission(kind: TermKind, action: &str) -> String {
    format!("{}.{action}", kind.permission_area())
}

async fn list_terms(kind: TermKind, state: AppState) -> AppResult<Json<Vec<Term>>> {
    Ok(Json(state.storage().list_terms(kind).await?))
}

async fn get_term(kind: TermKind, state: AppState, id: i32) -> AppResult<Json<Term>> {
    let term = state
        .storage()
        .get_term(kind, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    Ok(Json(term))
}

async fn get_term_by_slug(kind: TermKind, state: AppState, slug: String) -> AppResult<Json<Term>> {
    let term = state
        .storage()
        .get_term_by_slug(kind, &slug)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    Ok(Json(term))
}

async fn create_term(
    kind: TermKind,
    state: AppState,
    session: Session,
    body: ValidJson<CreateTerm>,
) -> AppResult<(StatusCode, Json<Term>)> {
    require_permission(&state, &session, &permission(kind, "create")).await?;
    let input = body.parse()?;

    let slug = slug_or_derive(input.slug.clone(), &input.name)?;
    let existing = state.storage().get_term_by_slug(kind, &slug).await?;
    ensure_slug_free(existing.map(|t| t.id), None, &slug)?;

    let term = state
        .storage()
        .insert_term(kind, input.into_record(slug))
        .await?;
    state.menus().invalidate();
    info!(kind = %kind, term_id = term.id, slug = %term.slug, "term created");
    Ok((StatusCode::CREATED, Json(term)))
}

async fn update_term(
    kind: TermKind,
    state: AppState,
    session: Session,
    id: i32,
    body: ValidJson<UpdateTerm>,
) -> AppResult<Json<Term>> {
    require_permission(&state, &session, &permission(kind, "edit")).await?;
    let patch = body.parse()?;

    let mut term = state
        .storage()
        .get_term(kind, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    if let Some(slug) = &patch.slug {
        let existing = state.storage().get_term_by_slug(kind, slug).await?;
        ensure_slug_free(existing.map(|t| t.id), Some(id), slug)?;
    }

    patch.apply(&mut term);
    let term = state
        .storage()
        .update_term(kind, term)
        .await?
        .ok_or_else(|| AppError::not_found(kind.label()))?;
    state.menus().invalidate();
    info!(kind = %kind, term_id = id, "term updated");
    Ok(Json(term))
}

async fn delete_term(
    kind: TermKind,
    state: AppState,
    session: Session,
    id: i32,
) -> AppResult<StatusCode> {
    require_permission(&state, &session, &permission(kind, "delete")).await?;
    if !state.storage().delete_term(kind, id).await? {
        return Err(AppError::not_found(kind.label()));
    }
    state.menus().invalidate();
    info!(kind = %kind, term_id = id, "term deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Routes for one vocabulary.
fn vocabulary(kind: TermKind) -> Router<AppState> {
    let base = format!("/api/{}", kind.table());

    Router::new()
        .route(
            &base,
            get(move |State(state): State<AppState>| list_terms(kind, state)).post(
                move |State(state): State<AppState>,
                      session: Session,
                      body: ValidJson<CreateTerm>| {
                    create_term(kind, state, session, body)
                },
            ),
        )
        .route(
            &format!("{base}/{{id}}"),
            get(move |State(state): State<AppState>, Path(id): Path<i32>| {
                get_term(kind, state, id)
            })
            .put(
                move |State(state): State<AppState>,
                      session: Session,
                      Path(id): Path<i32>,
                      body: ValidJson<UpdateTerm>| {
                    update_term(kind, state, session, id, body)
                },
            )
            .patch(
                move |State(state): State<AppState>,
                      session: Session,
                      Path(id): Path<i32>,
                      body: ValidJson<UpdateTerm>| {
                    update_term(kind, state, session, id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, session: Session, Path(id): Path<i32>| {
                    delete_term(kind, state, session, id)
                },
            ),
        )
        .route(
            &format!("{base}/slug/{{slug}}"),
            get(
                move |State(state): State<AppState>, Path(slug): Path<String>| {
                    get_term_by_slug(kind, state, slug)
                },
            ),
        )
}

pub fn router() -> Router<AppState> {
    TermKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| router.merge(vocabulary(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_follow_the_table_name() {
        assert_eq!(permission(TermKind::Category, "create"), "categories.create");
        assert_eq!(permission(TermKind::Country, "delete"), "countries.delete");
        assert!(crate::permissions::is_known(&permission(TermKind::Tag, "edit")));
    }
}
