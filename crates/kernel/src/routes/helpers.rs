//! Shared route helpers: session lookups, permission gates and the JSON
//! body extractor.

use std::marker::PhantomData;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::models::validate::slugify;
use crate::state::AppState;

/// Session key for the authenticated user id.
pub const SESSION_USER_ID: &str = "user_id";

/// The logged-in user, if any. Stale sessions pointing at deleted users
/// count as anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> AppResult<Option<User>> {
    let user_id: Option<i32> = session
        .get(SESSION_USER_ID)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read session: {e}"))?;

    match user_id {
        Some(id) => Ok(state.storage().get_user(id).await?),
        None => Ok(None),
    }
}

/// Require an authenticated user (401 otherwise).
pub async fn require_login(state: &AppState, session: &Session) -> AppResult<User> {
    current_user(state, session)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Require an authenticated user holding `permission` (401/403 otherwise).
pub async fn require_permission(
    state: &AppState,
    session: &Session,
    permission: &str,
) -> AppResult<User> {
    let user = require_login(state, session).await?;
    if state
        .permissions()
        .user_has_permission(&user, permission)
        .await?
    {
        Ok(user)
    } else {
        Err(AppError::forbidden())
    }
}

/// Whether the caller may see unpublished content of `area`.
pub async fn can_view_drafts(state: &AppState, session: &Session, area: &str) -> AppResult<bool> {
    match current_user(state, session).await? {
        Some(user) => Ok(state
            .permissions()
            .user_has_permission(&user, &format!("{area}.view"))
            .await?),
        None => Ok(false),
    }
}

/// Gate a single item on its published flag.
pub async fn ensure_visible(
    state: &AppState,
    session: &Session,
    area: &str,
    is_published: bool,
) -> AppResult<()> {
    if is_published || can_view_drafts(state, session, area).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("content is not published".to_string()))
    }
}

/// Published-only filter for callers without draft access; otherwise the
/// requested filter passes through.
pub async fn published_filter(
    state: &AppState,
    session: &Session,
    area: &str,
    requested: Option<bool>,
) -> AppResult<Option<bool>> {
    if can_view_drafts(state, session, area).await? {
        Ok(requested)
    } else {
        Ok(Some(true))
    }
}

/// The slug to store: the supplied one, or one derived from `title`.
pub fn slug_or_derive(slug: Option<String>, title: &str) -> AppResult<String> {
    let slug = match slug {
        Some(s) if !s.is_empty() => s,
        _ => slugify(title),
    };
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "a slug could not be derived; supply one explicitly".to_string(),
        ));
    }
    Ok(slug)
}

/// 400 when `existing` is a different record holding the slug.
pub fn ensure_slug_free(existing: Option<i32>, own_id: Option<i32>, slug: &str) -> AppResult<()> {
    match existing {
        Some(id) if Some(id) != own_id => Err(AppError::BadRequest(format!(
            "slug '{slug}' is already in use"
        ))),
        _ => Ok(()),
    }
}

/// Common query parameters for lists filtered by published state.
#[derive(Debug, Default, Deserialize)]
pub struct PublishedQuery {
    pub published: Option<bool>,
    pub limit: Option<u32>,
}

/// JSON request body, buffered by the extractor and parsed on demand.
///
/// Handlers call [`ValidJson::parse`] after their access checks so that
/// anonymous or unauthorized callers get 401/403 before any 400 about the
/// body itself.
#[derive(Debug)]
pub struct ValidJson<T> {
    bytes: Bytes,
    json_content_type: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ValidJson<T>
where
    T: DeserializeOwned + Validate,
{
    /// Deserialize and validate the body (400 on either failure).
    pub fn parse(self) -> AppResult<T> {
        if !self.json_content_type {
            return Err(AppError::BadRequest(
                "expected request with `Content-Type: application/json`".to_string(),
            ));
        }
        let Json(value) = Json::<T>::from_bytes(&self.bytes)
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(value)
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json_content_type = is_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(ValidJson {
            bytes,
            json_content_type,
            _marker: PhantomData,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_derived_when_missing() {
        assert_eq!(
            slug_or_derive(None, "Fully Funded Masters").ok().as_deref(),
            Some("fully-funded-masters")
        );
        assert_eq!(
            slug_or_derive(Some(String::new()), "About Us").ok().as_deref(),
            Some("about-us")
        );
        assert_eq!(
            slug_or_derive(Some("custom".into()), "Ignored").ok().as_deref(),
            Some("custom")
        );
        assert!(slug_or_derive(None, "!!!").is_err());
    }

    #[test]
    fn slug_conflicts_ignore_the_record_itself() {
        assert!(ensure_slug_free(None, None, "about").is_ok());
        assert!(ensure_slug_free(Some(3), Some(3), "about").is_ok());
        assert!(ensure_slug_free(Some(3), Some(4), "about").is_err());
        assert!(ensure_slug_free(Some(3), None, "about").is_err());
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(length(min = 1))]
        name: String,
    }

    fn body(content_type: Option<&str>, bytes: &'static str) -> ValidJson<Named> {
        ValidJson {
            bytes: Bytes::from_static(bytes.as_bytes()),
            json_content_type: content_type.is_some_and(|ct| {
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, ct.parse().unwrap());
                is_json_content_type(&headers)
            }),
            _marker: PhantomData,
        }
    }

    #[test]
    fn body_is_parsed_and_validated_on_demand() {
        let named = body(Some("application/json"), r#"{"name":"Ada"}"#)
            .parse()
            .unwrap();
        assert_eq!(named.name, "Ada");

        let vendor = body(Some("application/vnd.api+json; charset=utf-8"), r#"{"name":"x"}"#);
        assert!(vendor.parse().is_ok());

        for rejected in [
            body(Some("application/json"), r#"{"name":""}"#),
            body(Some("application/json"), "{not json"),
            body(Some("text/plain"), r#"{"name":"Ada"}"#),
            body(None, r#"{"name":"Ada"}"#),
        ] {
            let status = rejected.parse().map(|_| ()).unwrap_err().status();
            assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
        }
    }
}
