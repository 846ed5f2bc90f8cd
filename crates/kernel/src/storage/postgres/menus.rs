//! Menus, menu items and menu target resolution.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::PgStorage;
use crate::models::{Menu, MenuItem, MenuItemType, MenuLocation};
use crate::storage::{MenuStore, TargetInfo, term_kind_for};

#[async_trait]
impl MenuStore for PgStorage {
    async fn insert_menu(&self, menu: Menu) -> Result<Menu> {
        sqlx::query_as::<_, Menu>(
            r#"
            INSERT INTO menus (name, location, description, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&menu.name)
        .bind(menu.location.as_str())
        .bind(&menu.description)
        .bind(menu.is_active)
        .bind(menu.created_at)
        .bind(menu.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert menu")
    }

    async fn update_menu(&self, menu: Menu) -> Result<Option<Menu>> {
        sqlx::query_as::<_, Menu>(
            r#"
            UPDATE menus
            SET name = $2, location = $3, description = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(menu.id)
        .bind(&menu.name)
        .bind(menu.location.as_str())
        .bind(&menu.description)
        .bind(menu.is_active)
        .bind(menu.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update menu")
    }

    async fn get_menu(&self, id: i32) -> Result<Option<Menu>> {
        sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch menu")
    }

    async fn get_menu_by_location(&self, location: MenuLocation) -> Result<Option<Menu>> {
        sqlx::query_as::<_, Menu>("SELECT * FROM menus WHERE location = $1")
            .bind(location.as_str())
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch menu by location")
    }

    async fn list_menus(&self) -> Result<Vec<Menu>> {
        sqlx::query_as::<_, Menu>("SELECT * FROM menus ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list menus")
    }

    async fn delete_menu(&self, id: i32) -> Result<bool> {
        // menu_items cascade on the foreign key
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete menu")?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_menu_item(&self, item: MenuItem) -> Result<MenuItem> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items
                (menu_id, parent_id, title, item_type, target_id, url, icon,
                 open_in_new_tab, sort_order, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(item.menu_id)
        .bind(item.parent_id)
        .bind(&item.title)
        .bind(item.item_type.as_str())
        .bind(item.target_id)
        .bind(&item.url)
        .bind(&item.icon)
        .bind(item.open_in_new_tab)
        .bind(item.sort_order)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert menu item")
    }

    async fn update_menu_item(&self, item: MenuItem) -> Result<Option<MenuItem>> {
        sqlx::query_as::<_, MenuItem>(
            r#"
            UPDATE menu_items
            SET parent_id = $2, title = $3, item_type = $4, target_id = $5, url = $6,
                icon = $7, open_in_new_tab = $8, sort_order = $9, is_active = $10,
                updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(item.parent_id)
        .bind(&item.title)
        .bind(item.item_type.as_str())
        .bind(item.target_id)
        .bind(&item.url)
        .bind(&item.icon)
        .bind(item.open_in_new_tab)
        .bind(item.sort_order)
        .bind(item.is_active)
        .bind(item.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update menu item")
    }

    async fn get_menu_item(&self, id: i32) -> Result<Option<MenuItem>> {
        sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch menu item")
    }

    async fn list_menu_items(&self, menu_id: i32) -> Result<Vec<MenuItem>> {
        sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE menu_id = $1 ORDER BY sort_order, id",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list menu items")
    }

    async fn delete_menu_item(&self, id: i32) -> Result<bool> {
        // children cascade on parent_id
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete menu item")?;
        Ok(result.rows_affected() > 0)
    }

    async fn resolve_targets(
        &self,
        targets: &[(MenuItemType, i32)],
    ) -> Result<HashMap<(MenuItemType, i32), TargetInfo>> {
        let mut by_type: HashMap<MenuItemType, Vec<i32>> = HashMap::new();
        for &(item_type, id) in targets {
            by_type.entry(item_type).or_default().push(id);
        }

        let mut resolved = HashMap::new();
        for (item_type, ids) in by_type {
            let sql = match (item_type, term_kind_for(item_type)) {
                (_, Some(kind)) => format!(
                    "SELECT id, name, icon FROM {} WHERE id = ANY($1)",
                    kind.table()
                ),
                (MenuItemType::Page, None) => {
                    "SELECT id, title, NULL::TEXT FROM pages WHERE id = ANY($1)".to_string()
                }
                (MenuItemType::Scholarship, None) => {
                    "SELECT id, title, NULL::TEXT FROM scholarships WHERE id = ANY($1)".to_string()
                }
                (MenuItemType::Post, None) => {
                    "SELECT id, title, NULL::TEXT FROM posts WHERE id = ANY($1)".to_string()
                }
                _ => continue,
            };

            let rows = sqlx::query_as::<_, (i32, String, Option<String>)>(&sql)
                .bind(&ids)
                .fetch_all(&self.pool)
                .await
                .with_context(|| format!("failed to resolve {item_type} menu targets"))?;

            for (id, label, icon) in rows {
                resolved.insert((item_type, id), TargetInfo { label, icon });
            }
        }

        Ok(resolved)
    }
}
