#![allow(clippy::unwrap_used, clippy::expect_used)]
//! PostgreSQL storage behavior that the in-memory backend cannot vouch for:
//! transactional role changes, foreign key cascades and target lookups.
//!
//! Runs only when `DATABASE_URL` points at a PostgreSQL server. Each test
//! migrates a throwaway schema and drops it afterwards.

use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use scholaris_kernel::db;
use scholaris_kernel::models::{Menu, MenuItem, MenuItemType, MenuLocation, Role, Term, TermKind, User};
use scholaris_kernel::storage::{MenuStore, PgStorage, RoleStore, TermStore, UserStore};

struct TestDb {
    admin: PgPool,
    schema: String,
    storage: PgStorage,
}

impl TestDb {
    /// `None` when no database is configured.
    async fn connect() -> Option<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;

        let admin = db::create_pool(&url, 1).await.expect("Failed to connect");
        let schema = format!("test_{}", uuid::Uuid::now_v7().simple());
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .expect("Failed to create schema");

        let options = url
            .parse::<PgConnectOptions>()
            .expect("Invalid DATABASE_URL")
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .expect("Failed to connect to test schema");
        db::run_migrations(&pool).await.expect("Failed to migrate");

        Some(Self {
            admin,
            schema,
            storage: PgStorage::new(pool),
        })
    }

    async fn teardown(self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("Failed to drop schema");
    }
}

fn role(name: &str, is_default: bool) -> Role {
    Role {
        id: 0,
        name: name.to_string(),
        description: None,
        permissions: vec!["dashboard.view".to_string()],
        is_default,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn user(username: &str, role_id: Option<i32>) -> User {
    User {
        id: 0,
        username: username.to_string(),
        email: None,
        password_hash: "not-a-real-hash".to_string(),
        role_id,
        is_admin: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn menu(location: MenuLocation) -> Menu {
    Menu {
        id: 0,
        name: format!("{location} menu"),
        location,
        description: None,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn link(menu_id: i32, parent_id: Option<i32>, title: &str) -> MenuItem {
    MenuItem {
        id: 0,
        menu_id,
        parent_id,
        title: title.to_string(),
        item_type: MenuItemType::Link,
        target_id: None,
        url: Some(format!("/{title}")),
        icon: None,
        open_in_new_tab: false,
        sort_order: 0,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn deleting_a_role_reassigns_its_users() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let storage = &db.storage;

    let reader = storage.insert_role(role("Reader", true)).await.unwrap();
    let editor = storage.insert_role(role("Editor", false)).await.unwrap();
    let ana = storage.insert_user(user("ana", Some(editor.id))).await.unwrap();
    let ben = storage.insert_user(user("ben", Some(editor.id))).await.unwrap();
    let cy = storage.insert_user(user("cy", Some(reader.id))).await.unwrap();

    assert!(storage.delete_role(editor.id, Some(reader.id)).await.unwrap());
    assert!(storage.get_role(editor.id).await.unwrap().is_none());
    for id in [ana.id, ben.id, cy.id] {
        let user = storage.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.role_id, Some(reader.id));
    }

    // Without a replacement users fall back to no explicit role.
    let temp = storage.insert_role(role("Temp", false)).await.unwrap();
    let dee = storage.insert_user(user("dee", Some(temp.id))).await.unwrap();
    assert!(storage.delete_role(temp.id, None).await.unwrap());
    assert_eq!(storage.get_user(dee.id).await.unwrap().unwrap().role_id, None);

    assert!(!storage.delete_role(9999, Some(reader.id)).await.unwrap());

    db.teardown().await;
}

#[tokio::test]
async fn only_one_role_is_default() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let storage = &db.storage;

    let reader = storage.insert_role(role("Reader", true)).await.unwrap();
    let member = storage.insert_role(role("Member", false)).await.unwrap();

    // The partial unique index refuses a second default.
    assert!(storage.insert_role(role("Other", true)).await.is_err());

    assert!(storage.set_default_role(member.id).await.unwrap());
    assert_eq!(storage.get_default_role().await.unwrap().unwrap().id, member.id);
    assert!(!storage.get_role(reader.id).await.unwrap().unwrap().is_default);

    // An unknown role leaves the current default in place.
    assert!(!storage.set_default_role(9999).await.unwrap());
    assert_eq!(storage.get_default_role().await.unwrap().unwrap().id, member.id);

    let defaults = storage
        .list_roles()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.is_default)
        .count();
    assert_eq!(defaults, 1);

    db.teardown().await;
}

#[tokio::test]
async fn menu_deletes_cascade_to_subtrees() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let storage = &db.storage;

    let header = storage.insert_menu(menu(MenuLocation::Header)).await.unwrap();
    let root = storage.insert_menu_item(link(header.id, None, "root")).await.unwrap();
    let child = storage
        .insert_menu_item(link(header.id, Some(root.id), "child"))
        .await
        .unwrap();
    let grandchild = storage
        .insert_menu_item(link(header.id, Some(child.id), "grandchild"))
        .await
        .unwrap();
    let sibling = storage.insert_menu_item(link(header.id, None, "sibling")).await.unwrap();

    assert!(storage.delete_menu_item(root.id).await.unwrap());
    for gone in [root.id, child.id, grandchild.id] {
        assert!(storage.get_menu_item(gone).await.unwrap().is_none());
    }
    let remaining: Vec<i32> = storage
        .list_menu_items(header.id)
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(remaining, vec![sibling.id]);

    assert!(storage.delete_menu(header.id).await.unwrap());
    assert!(storage.get_menu_item(sibling.id).await.unwrap().is_none());
    assert!(
        storage
            .get_menu_by_location(MenuLocation::Header)
            .await
            .unwrap()
            .is_none()
    );

    db.teardown().await;
}

#[tokio::test]
async fn targets_resolve_by_type_and_skip_missing_rows() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let storage = &db.storage;

    let engineering = storage
        .insert_term(
            TermKind::Category,
            Term {
                id: 0,
                name: "Engineering".to_string(),
                slug: "engineering".to_string(),
                description: None,
                icon: Some("cog".to_string()),
                sort_order: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();

    let resolved = storage
        .resolve_targets(&[
            (MenuItemType::Category, engineering.id),
            (MenuItemType::Category, engineering.id + 1000),
            (MenuItemType::Page, 77),
            // Same id, different table.
            (MenuItemType::Level, engineering.id),
        ])
        .await
        .unwrap();

    assert_eq!(resolved.len(), 1);
    let info = &resolved[&(MenuItemType::Category, engineering.id)];
    assert_eq!(info.label, "Engineering");
    assert_eq!(info.icon.as_deref(), Some("cog"));

    db.teardown().await;
}
