#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Roles, permission checks and session authentication.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

mod common;
use common::{ADMIN_PASSWORD, TestApp};

#[tokio::test]
async fn role_permissions_round_trip() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (status, role) = app
        .post(
            "/api/roles",
            json!({
                "name": "Editor",
                "description": "Content editors",
                "permissions": ["pages.create", "pages.edit", "scholarships.view"],
            }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{role}");
    assert_eq!(role["isDefault"], false);

    let (status, fetched) = app
        .get(&format!("/api/roles/{}", role["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched["permissions"],
        json!(["pages.create", "pages.edit", "scholarships.view"])
    );

    let (status, updated) = app
        .patch(
            &format!("/api/roles/{}", role["id"]),
            json!({ "permissions": ["pages.view"] }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["permissions"], json!(["pages.view"]));
    assert_eq!(updated["description"], "Content editors");
}

#[tokio::test]
async fn role_writes_are_validated() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (status, body) = app
        .post(
            "/api/roles",
            json!({ "name": "Odd", "permissions": ["pages.fly"] }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("pages.fly"));

    let (status, _) = app
        .post("/api/roles", json!({ "name": "Editor", "permissions": [] }), &admin)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/api/roles", json!({ "name": "Editor", "permissions": [] }), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/roles/9999", &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn one_default_role_at_a_time() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (_, a) = app
        .post(
            "/api/roles",
            json!({ "name": "Reader", "permissions": [], "isDefault": true }),
            &admin,
        )
        .await;
    let (_, b) = app
        .post("/api/roles", json!({ "name": "Member", "permissions": [] }), &admin)
        .await;
    assert_eq!(a["isDefault"], true);

    let (status, promoted) = app
        .post(&format!("/api/roles/{}/default", b["id"]), json!({}), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["isDefault"], true);

    let (_, a_now) = app.get(&format!("/api/roles/{}", a["id"]), &admin).await;
    assert_eq!(a_now["isDefault"], false);

    // The default role cannot be deleted; the former default can.
    let (status, _) = app
        .delete(&format!("/api/roles/{}", b["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .delete(&format!("/api/roles/{}", a["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn users_without_a_role_get_the_default_role() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    app.post(
        "/api/roles",
        json!({ "name": "Reader", "permissions": ["dashboard.view"], "isDefault": true }),
        &admin,
    )
    .await;

    app.create_user("plain", "plain-password", None, false).await;
    let plain = app.login("plain", "plain-password").await;

    let (status, me) = app.get("/api/user", &plain).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "plain");
    assert_eq!(me["permissions"], json!(["dashboard.view"]));
    assert!(me.get("passwordHash").is_none());

    let (status, _) = app.get("/api/admin/stats", &plain).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn permission_checks_return_401_and_403() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/roles", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/api/user", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let editor = app
        .login_with_permissions("editor", &["pages.create"])
        .await;
    let (status, _) = app.get("/api/roles", &editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get("/api/admin/stats", &editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = app.get("/api/user", &editor).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["permissions"], json!(["pages.create"]));
}

#[tokio::test]
async fn access_checks_run_before_body_validation() {
    let app = TestApp::new().await;

    // Missing required fields.
    let (status, _) = app.post("/api/roles", json!({}), "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Not JSON at all.
    let malformed = Request::post("/api/pages")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.request(malformed).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let editor = app
        .login_with_permissions("editor", &["pages.create"])
        .await;
    let (status, _) = app.post("/api/roles", json!({}), &editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // With the permission the body is finally looked at.
    let (status, _) = app.post("/api/pages", json!({}), &editor).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn role_changes_apply_to_existing_sessions() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let viewer = app.login_with_permissions("viewer", &["roles.view"]).await;

    let (status, roles) = app.get("/api/roles", &viewer).await;
    assert_eq!(status, StatusCode::OK);
    let role_id = roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "viewer-role")
        .unwrap()["id"]
        .clone();

    app.put(
        &format!("/api/roles/{role_id}"),
        json!({ "permissions": [] }),
        &admin,
    )
    .await;

    let (status, _) = app.get("/api/roles", &viewer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn permission_catalog_is_listed() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (status, catalog) = app.get("/api/permissions", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let groups = catalog.as_array().unwrap();
    let menus = groups.iter().find(|g| g["area"] == "menus").unwrap();
    let ids: Vec<&str> = menus["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"menus.view"));
    assert!(ids.contains(&"menus.edit"));

    // Admins hold every permission in the catalog.
    let (_, me) = app.get("/api/user", &admin).await;
    let total: usize = groups
        .iter()
        .map(|g| g["permissions"].as_array().unwrap().len())
        .sum();
    assert_eq!(me["permissions"].as_array().unwrap().len(), total);
}

#[tokio::test]
async fn assign_role_to_user() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (_, role) = app
        .post(
            "/api/roles",
            json!({ "name": "Stats", "permissions": ["dashboard.view"] }),
            &admin,
        )
        .await;
    let user_id = app.create_user("pat", "pat-password", None, false).await;
    let pat = app.login("pat", "pat-password").await;

    let (status, _) = app.get("/api/admin/stats", &pat).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = app
        .put(
            &format!("/api/users/{user_id}/role"),
            json!({ "roleId": role["id"] }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["roleId"], role["id"]);

    let (status, _) = app.get("/api/admin/stats", &pat).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put(
            &format!("/api/users/{user_id}/role"),
            json!({ "roleId": 4242 }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_create_admins() {
    let app = TestApp::new().await;
    let manager = app
        .login_with_permissions("manager", &["users.create", "users.view"])
        .await;

    let (status, _) = app
        .post(
            "/api/users",
            json!({ "username": "root2", "password": "long-enough-pw", "isAdmin": true }),
            &manager,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = app
        .post(
            "/api/users",
            json!({ "username": "staff", "password": "long-enough-pw" }),
            &manager,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert_eq!(user["isAdmin"], false);

    let (status, _) = app
        .post(
            "/api/users",
            json!({ "username": "staff", "password": "long-enough-pw" }),
            &manager,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_admins_modify_admins() {
    let app = TestApp::new().await;
    let root = app.create_user("root", "root-password", None, true).await;
    let pat = app.create_user("pat", "pat-password", None, false).await;
    let helpdesk = app
        .login_with_permissions("helpdesk", &["users.view", "users.edit", "users.delete"])
        .await;

    let (status, _) = app
        .patch(
            &format!("/api/users/{root}"),
            json!({ "password": "taken-over-pw" }),
            &helpdesk,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .put(
            &format!("/api/users/{root}/role"),
            json!({ "roleId": null }),
            &helpdesk,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&format!("/api/users/{root}"), &helpdesk).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The administrator account is untouched.
    let root_session = app.login("root", "root-password").await;
    let (status, me) = app.get("/api/user", &root_session).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["isAdmin"], true);

    // Regular accounts stay manageable.
    let (status, _) = app
        .patch(
            &format!("/api/users/{pat}"),
            json!({ "password": "reset-by-desk" }),
            &helpdesk,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete(&format!("/api/users/{pat}"), &helpdesk).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Administrators still manage each other.
    let (status, _) = app
        .patch(
            &format!("/api/users/{root}"),
            json!({ "password": "rotated-root-pw" }),
            &root_session,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;

    let (status, _) = app.get("/api/user", &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post("/api/logout", json!({}), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/user", &admin).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let app = TestApp::new().await;
    app.create_user("admin", ADMIN_PASSWORD, None, true).await;

    for _ in 0..4 {
        let (status, _) = app
            .post(
                "/api/login",
                json!({ "username": "admin", "password": "wrong" }),
                "",
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = app
        .post(
            "/api/login",
            json!({ "username": "admin", "password": "wrong" }),
            "",
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Even the right password is refused while locked.
    let (status, _) = app
        .post(
            "/api/login",
            json!({ "username": "admin", "password": ADMIN_PASSWORD }),
            "",
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}
