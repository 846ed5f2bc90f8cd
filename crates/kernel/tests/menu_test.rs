#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Menu administration and navigation tree resolution through the HTTP API.

use axum::http::StatusCode;
use serde_json::{Value, json};

mod common;
use common::TestApp;

async fn create_menu(app: &TestApp, cookies: &str, location: &str) -> i64 {
    let (status, menu) = app
        .post(
            "/api/menus",
            json!({ "name": format!("{location} menu"), "location": location }),
            cookies,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{menu}");
    menu["id"].as_i64().unwrap()
}

async fn create_item(app: &TestApp, cookies: &str, menu_id: i64, body: Value) -> Value {
    let (status, item) = app
        .post(&format!("/api/menus/{menu_id}/items"), body, cookies)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    item
}

#[tokio::test]
async fn location_parameter_is_validated() {
    let app = TestApp::new().await;

    for location in ["top", "HEADER", "", "footer%20"] {
        let (status, _) = app
            .get(&format!("/api/menu-structure?location={location}"), "")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "location {location:?}");
    }

    let (status, body) = app.get("/api/menu-structure", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("location"));

    // Valid location without a menu.
    let (status, _) = app.get("/api/menu-structure?location=sidebar", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn structure_resolves_urls_order_and_nesting() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let menu_id = create_menu(&app, &admin, "header").await;

    let (_, category) = app
        .post(
            "/api/categories",
            json!({ "name": "Engineering", "icon": "cog" }),
            &admin,
        )
        .await;
    let category_id = category["id"].as_i64().unwrap();

    let about = create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "About", "type": "page", "targetId": 7, "order": 2 }),
    )
    .await;
    let browse = create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "", "type": "category", "targetId": category_id, "order": 1 }),
    )
    .await;
    create_item(
        &app,
        &admin,
        menu_id,
        json!({
            "title": "Blog",
            "type": "link",
            "url": "https://blog.example.org",
            "openInNewTab": true,
            "parentId": about["id"],
        }),
    )
    .await;
    create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "Placeholder", "type": "link", "parentId": about["id"], "order": 5 }),
    )
    .await;

    let (status, body) = app.get("/api/menu-structure?location=header", "").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["menu"]["location"], "header");

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    // Sorted by order: the category entry first.
    assert_eq!(items[0]["id"], browse["id"]);
    assert_eq!(items[0]["title"], "Engineering");
    assert_eq!(items[0]["icon"], "cog");
    assert_eq!(
        items[0]["url"],
        format!("/scholarships?category={category_id}")
    );
    assert_eq!(items[0]["targetMissing"], false);

    assert_eq!(items[1]["title"], "About");
    assert_eq!(items[1]["url"], "/page/7");
    assert_eq!(items[1]["icon"], "file-text");
    // The page does not exist.
    assert_eq!(items[1]["targetMissing"], true);

    let children = items[1]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["url"], "https://blog.example.org");
    assert_eq!(children[0]["openInNewTab"], true);
    assert_eq!(children[1]["url"], "#");
    assert_eq!(children[1]["icon"], "link");
}

#[tokio::test]
async fn deleted_target_still_resolves() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let menu_id = create_menu(&app, &admin, "footer").await;

    let (_, category) = app
        .post("/api/categories", json!({ "name": "Medicine" }), &admin)
        .await;
    let category_id = category["id"].as_i64().unwrap();
    create_item(
        &app,
        &admin,
        menu_id,
        json!({ "type": "category", "targetId": category_id }),
    )
    .await;

    let (_, before) = app.get("/api/menu-structure?location=footer", "").await;
    assert_eq!(before["items"][0]["title"], "Medicine");

    let (status, _) = app
        .delete(&format!("/api/categories/{category_id}"), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, after) = app.get("/api/menu-structure?location=footer", "").await;
    assert_eq!(status, StatusCode::OK);
    let item = &after["items"][0];
    assert_eq!(item["title"], "Untitled");
    assert_eq!(item["icon"], "folder");
    assert_eq!(item["targetMissing"], true);
    assert_eq!(
        item["url"],
        format!("/scholarships?category={category_id}")
    );
}

#[tokio::test]
async fn inactive_menus_and_items_are_hidden() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let menu_id = create_menu(&app, &admin, "mobile").await;

    let parent = create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "Hidden", "type": "link", "url": "/hidden", "isActive": false }),
    )
    .await;
    create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "Child", "type": "link", "url": "/child", "parentId": parent["id"] }),
    )
    .await;
    create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "Visible", "type": "link", "url": "/visible" }),
    )
    .await;

    let (_, body) = app.get("/api/menu-structure?location=mobile", "").await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Visible");

    let (status, _) = app
        .patch(
            &format!("/api/menus/{menu_id}"),
            json!({ "isActive": false }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/menu-structure?location=mobile", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn structural_writes_are_validated() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let header = create_menu(&app, &admin, "header").await;
    let footer = create_menu(&app, &admin, "footer").await;

    // One menu per location.
    let (status, _) = app
        .post(
            "/api/menus",
            json!({ "name": "Second header", "location": "header" }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-link items need a target.
    let (status, _) = app
        .post(
            &format!("/api/menus/{header}/items"),
            json!({ "title": "Broken", "type": "scholarship" }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown type tag.
    let (status, _) = app
        .post(
            &format!("/api/menus/{header}/items"),
            json!({ "title": "Odd", "type": "video", "targetId": 1 }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let a = create_item(&app, &admin, header, json!({ "title": "A", "type": "link" })).await;
    let b = create_item(
        &app,
        &admin,
        header,
        json!({ "title": "B", "type": "link", "parentId": a["id"] }),
    )
    .await;

    // A under its own child would form a cycle.
    let (status, _) = app
        .patch(
            &format!("/api/menu-items/{}", a["id"]),
            json!({ "parentId": b["id"] }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Parents must belong to the same menu.
    let (status, _) = app
        .post(
            &format!("/api/menus/{footer}/items"),
            json!({ "title": "C", "type": "link", "parentId": a["id"] }),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting a parent removes its subtree.
    let (status, _) = app
        .delete(&format!("/api/menu-items/{}", a["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("/api/menu-items/{}", b["id"]), &admin)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cached_structure_follows_writes() {
    let app = TestApp::new().await;
    let admin = app.login_admin().await;
    let menu_id = create_menu(&app, &admin, "sidebar").await;
    let item = create_item(
        &app,
        &admin,
        menu_id,
        json!({ "title": "Old", "type": "link", "url": "/old" }),
    )
    .await;

    let (_, first) = app.get("/api/menu-structure?location=sidebar", "").await;
    assert_eq!(first["items"][0]["title"], "Old");

    app.put(
        &format!("/api/menu-items/{}", item["id"]),
        json!({ "title": "New" }),
        &admin,
    )
    .await;

    let (_, second) = app.get("/api/menu-structure?location=sidebar", "").await;
    assert_eq!(second["items"][0]["title"], "New");
    assert_eq!(second["items"][0]["url"], "/old");
}

#[tokio::test]
async fn menu_admin_requires_permissions() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/menus", "").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let viewer = app.login_with_permissions("viewer", &["menus.view"]).await;
    let (status, _) = app.get("/api/menus", &viewer).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/menus",
            json!({ "name": "Header", "location": "header" }),
            &viewer,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
