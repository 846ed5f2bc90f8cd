#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test gets its own [`TestApp`]: the real router and services over
//! the in-memory storage backend and the memory session store, so tests
//! need no external services and never share state.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use scholaris_kernel::config::Config;
use scholaris_kernel::models::{CreateRole, CreateUser};
use scholaris_kernel::routes::build_app;
use scholaris_kernel::state::AppState;
use scholaris_kernel::storage::{MemStorage, RoleStore, UserStore};

pub const ADMIN_PASSWORD: &str = "admin-password";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    /// Upload directory; removed when the app is dropped.
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create upload dir");
        let config = Config {
            uploads_dir: uploads.path().to_path_buf(),
            max_upload_bytes: 64 * 1024,
            ..Config::default()
        };

        let state = AppState::with_storage(config, Arc::new(MemStorage::new()));
        let router = build_app(state.clone())
            .await
            .expect("Failed to build router");

        Self {
            router,
            state,
            uploads,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// Send a request with optional JSON body and session cookies, returning
    /// the status and the parsed body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookies: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.request(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str, cookies: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, cookies).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookies: &str) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), cookies).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookies: &str) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), cookies).await
    }

    pub async fn patch(&self, uri: &str, body: Value, cookies: &str) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body), cookies).await
    }

    pub async fn delete(&self, uri: &str, cookies: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, cookies).await
    }

    /// Login via JSON API and return session cookies.
    ///
    /// # Panics
    ///
    /// Panics if the login response is not 200 OK.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                Request::post("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "username": username, "password": password }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;

        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Login failed for user '{username}' (status {})",
            response.status()
        );

        extract_cookies(&response)
    }

    /// Create a user directly in storage.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        role_id: Option<i32>,
        is_admin: bool,
    ) -> i32 {
        let user = CreateUser {
            username: username.to_string(),
            email: None,
            password: password.to_string(),
            role_id,
            is_admin,
        }
        .into_record()
        .expect("Failed to hash password");

        self.state
            .storage()
            .insert_user(user)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Create an admin and return session cookies after logging in.
    pub async fn login_admin(&self) -> String {
        self.create_user("admin", ADMIN_PASSWORD, None, true).await;
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Create a user holding a fresh role with `permissions` and return
    /// session cookies after logging in.
    pub async fn login_with_permissions(&self, username: &str, permissions: &[&str]) -> String {
        let role = CreateRole {
            name: format!("{username}-role"),
            description: None,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            is_default: false,
        }
        .into_record();
        let role = self
            .state
            .storage()
            .insert_role(role)
            .await
            .expect("Failed to create test role");

        let password = "user-password";
        self.create_user(username, password, Some(role.id), false)
            .await;
        self.login(username, password).await
    }
}

/// Collect a response body as JSON (`Null` when empty).
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    }
}

/// Extract Set-Cookie headers from a response for use in subsequent requests.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}
