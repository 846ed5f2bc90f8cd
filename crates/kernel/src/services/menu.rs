//! Menu management and navigation tree resolution.
//!
//! A menu's items are fetched in one storage call and assembled into a tree
//! in memory. Each node gets a display URL derived from its type tag, a
//! label and an icon, falling back to the referenced entity and then to
//! per-type defaults. Resolved trees are cached per location.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::models::{
    CreateMenu, CreateMenuItem, Menu, MenuItem, MenuItemType, MenuLocation, UpdateMenu,
    UpdateMenuItem,
};
use crate::storage::{Storage, TargetInfo};

/// Label used when neither the item nor its target supplies one.
pub const UNTITLED: &str = "Untitled";

const CACHE_NAME: &str = "menu";

/// A resolved navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub item_type: MenuItemType,
    pub target_id: Option<i32>,
    pub open_in_new_tab: bool,
    pub order: i32,
    /// The referenced entity no longer exists.
    pub target_missing: bool,
    pub children: Vec<MenuNode>,
}

/// A menu with its resolved item tree.
#[derive(Debug, Clone, Serialize)]
pub struct MenuStructure {
    pub menu: Menu,
    pub items: Vec<MenuNode>,
}

/// Display URL for an item, by type tag.
pub fn resolve_url(item_type: MenuItemType, target_id: Option<i32>, url: Option<&str>) -> String {
    let id = match (item_type, target_id) {
        (MenuItemType::Link, _) => return non_empty(url).unwrap_or("#").to_string(),
        (_, None) => return "#".to_string(),
        (_, Some(id)) => id,
    };

    match item_type {
        MenuItemType::Page => format!("/page/{id}"),
        MenuItemType::Category => format!("/scholarships?category={id}"),
        MenuItemType::Level => format!("/scholarships?level={id}"),
        MenuItemType::Country => format!("/scholarships?country={id}"),
        MenuItemType::Scholarship => format!("/scholarship/{id}"),
        MenuItemType::Post => format!("/article/{id}"),
        MenuItemType::Link => "#".to_string(),
    }
}

pub fn default_icon(item_type: MenuItemType) -> &'static str {
    match item_type {
        MenuItemType::Page => "file-text",
        MenuItemType::Category => "folder",
        MenuItemType::Level => "graduation-cap",
        MenuItemType::Country => "globe",
        MenuItemType::Scholarship => "award",
        MenuItemType::Post => "newspaper",
        MenuItemType::Link => "link",
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_node(item: &MenuItem, target: Option<&TargetInfo>, children: Vec<MenuNode>) -> MenuNode {
    let title = non_empty(Some(&item.title))
        .or_else(|| target.and_then(|t| non_empty(Some(&t.label))))
        .unwrap_or(UNTITLED)
        .to_string();

    let icon = non_empty(item.icon.as_deref())
        .or_else(|| target.and_then(|t| non_empty(t.icon.as_deref())))
        .unwrap_or(default_icon(item.item_type))
        .to_string();

    MenuNode {
        id: item.id,
        title,
        url: resolve_url(item.item_type, item.target_id, item.url.as_deref()),
        icon,
        item_type: item.item_type,
        target_id: item.target_id,
        open_in_new_tab: item.open_in_new_tab,
        order: item.sort_order,
        target_missing: item.item_type.needs_target() && target.is_none(),
        children,
    }
}

/// Assemble the flat item list of one menu into an ordered tree.
///
/// Siblings sort by `(order, id)`. Inactive items are dropped with their
/// subtrees. Items that cannot be reached from a top-level item (cycles or
/// dangling parents) are skipped with a warning.
pub fn build_tree(
    items: &[MenuItem],
    targets: &HashMap<(MenuItemType, i32), TargetInfo>,
) -> Vec<MenuNode> {
    let ids: HashSet<i32> = items.iter().map(|i| i.id).collect();
    let mut children: HashMap<Option<i32>, Vec<&MenuItem>> = HashMap::new();
    for item in items {
        // a dangling parent reference can never be reached
        if item.parent_id.is_some_and(|p| !ids.contains(&p)) {
            warn!(item_id = item.id, parent_id = ?item.parent_id, "menu item has a missing parent; skipped");
            continue;
        }
        children.entry(item.parent_id).or_default().push(item);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|i| (i.sort_order, i.id));
    }

    let mut reachable = HashSet::new();
    let mut stack: Vec<i32> = children
        .get(&None)
        .map(|roots| roots.iter().map(|i| i.id).collect())
        .unwrap_or_default();
    while let Some(id) = stack.pop() {
        if reachable.insert(id) {
            if let Some(kids) = children.get(&Some(id)) {
                stack.extend(kids.iter().map(|i| i.id));
            }
        }
    }
    for item in items {
        if !reachable.contains(&item.id) && item.parent_id.is_none_or(|p| ids.contains(&p)) {
            warn!(item_id = item.id, parent_id = ?item.parent_id, "menu item is unreachable from the top level; skipped");
        }
    }

    fn assemble(
        parent: Option<i32>,
        children: &HashMap<Option<i32>, Vec<&MenuItem>>,
        targets: &HashMap<(MenuItemType, i32), TargetInfo>,
    ) -> Vec<MenuNode> {
        let Some(siblings) = children.get(&parent) else {
            return Vec::new();
        };
        siblings
            .iter()
            .filter(|item| item.is_active)
            .map(|item| {
                let target = item
                    .target_id
                    .and_then(|id| targets.get(&(item.item_type, id)));
                let kids = assemble(Some(item.id), children, targets);
                resolve_node(item, target, kids)
            })
            .collect()
    }

    assemble(None, &children, targets)
}

/// Menu service: CRUD with structural validation and cached tree resolution.
pub struct MenuService {
    storage: Arc<dyn Storage>,
    metrics: Arc<Metrics>,
    cache: Cache<MenuLocation, Arc<MenuStructure>>,
    /// Bumped by every invalidation; trees built across a bump are not cached.
    generation: AtomicU64,
}

impl MenuService {
    pub fn new(storage: Arc<dyn Storage>, metrics: Arc<Metrics>) -> Self {
        let cache = Cache::builder()
            .max_capacity(MenuLocation::ALL.len() as u64)
            .time_to_live(Duration::from_secs(300))
            .build();
        Self {
            storage,
            metrics,
            cache,
            generation: AtomicU64::new(0),
        }
    }

    /// Resolved tree for a placement location.
    pub async fn structure(&self, location: MenuLocation) -> AppResult<Arc<MenuStructure>> {
        if let Some(cached) = self.cache.get(&location).await {
            self.metrics.record_cache_hit(CACHE_NAME);
            return Ok(cached);
        }
        self.metrics.record_cache_miss(CACHE_NAME);
        let generation = self.generation.load(Ordering::Acquire);

        let menu = self
            .storage
            .get_menu_by_location(location)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| AppError::NotFound(format!("no active menu for location {location}")))?;

        let items = self.storage.list_menu_items(menu.id).await?;

        let mut wanted: Vec<(MenuItemType, i32)> = items
            .iter()
            .filter(|i| i.is_active && i.item_type.needs_target())
            .filter_map(|i| i.target_id.map(|id| (i.item_type, id)))
            .collect();
        wanted.sort_unstable_by_key(|&(t, id)| (t.as_str(), id));
        wanted.dedup();
        let targets = self.storage.resolve_targets(&wanted).await?;

        let structure = Arc::new(MenuStructure {
            items: build_tree(&items, &targets),
            menu,
        });
        self.cache_if_current(location, generation, &structure).await;
        Ok(structure)
    }

    /// Cache a tree built from data read at `generation`, unless an
    /// invalidation happened since.
    async fn cache_if_current(
        &self,
        location: MenuLocation,
        generation: u64,
        structure: &Arc<MenuStructure>,
    ) {
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        self.cache.insert(location, Arc::clone(structure)).await;
        // An invalidation may have landed between the check and the insert.
        if self.generation.load(Ordering::Acquire) != generation {
            self.cache.invalidate(&location).await;
        }
    }

    /// Drop every cached tree. Called after writes to menus or to anything
    /// a menu item can reference.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }

    pub async fn list_menus(&self) -> AppResult<Vec<Menu>> {
        Ok(self.storage.list_menus().await?)
    }

    pub async fn get_menu(&self, id: i32) -> AppResult<Menu> {
        self.storage
            .get_menu(id)
            .await?
            .ok_or_else(|| AppError::not_found("menu"))
    }

    pub async fn create_menu(&self, input: CreateMenu) -> AppResult<Menu> {
        input.validate()?;
        self.ensure_location_free(input.location, None).await?;

        let menu = self.storage.insert_menu(input.into_record()).await?;
        self.invalidate();
        info!(menu_id = menu.id, location = %menu.location, "menu created");
        Ok(menu)
    }

    pub async fn update_menu(&self, id: i32, patch: UpdateMenu) -> AppResult<Menu> {
        patch.validate()?;
        let mut menu = self.get_menu(id).await?;
        if let Some(location) = patch.location {
            self.ensure_location_free(location, Some(id)).await?;
        }

        patch.apply(&mut menu);
        let menu = self
            .storage
            .update_menu(menu)
            .await?
            .ok_or_else(|| AppError::not_found("menu"))?;
        self.invalidate();
        info!(menu_id = id, "menu updated");
        Ok(menu)
    }

    pub async fn delete_menu(&self, id: i32) -> AppResult<()> {
        if !self.storage.delete_menu(id).await? {
            return Err(AppError::not_found("menu"));
        }
        self.invalidate();
        info!(menu_id = id, "menu deleted");
        Ok(())
    }

    /// All items of a menu, flat, in display order.
    pub async fn list_items(&self, menu_id: i32) -> AppResult<Vec<MenuItem>> {
        self.get_menu(menu_id).await?;
        let mut items = self.storage.list_menu_items(menu_id).await?;
        items.sort_by_key(|i| (i.parent_id, i.sort_order, i.id));
        Ok(items)
    }

    pub async fn get_item(&self, id: i32) -> AppResult<MenuItem> {
        self.storage
            .get_menu_item(id)
            .await?
            .ok_or_else(|| AppError::not_found("menu item"))
    }

    pub async fn create_item(&self, menu_id: i32, input: CreateMenuItem) -> AppResult<MenuItem> {
        input.validate()?;
        self.get_menu(menu_id).await?;

        let item = input.into_record(menu_id);
        item.check_target().map_err(AppError::BadRequest)?;
        if let Some(parent_id) = item.parent_id {
            self.check_parent(&item, parent_id).await?;
        }

        let item = self.storage.insert_menu_item(item).await?;
        self.invalidate();
        info!(menu_id, item_id = item.id, item_type = %item.item_type, "menu item created");
        Ok(item)
    }

    pub async fn update_item(&self, id: i32, patch: UpdateMenuItem) -> AppResult<MenuItem> {
        patch.validate()?;
        if let Err(e) = patch.check_url() {
            let mut errors = validator::ValidationErrors::new();
            errors.add("url", e);
            return Err(errors.into());
        }

        let mut item = self.get_item(id).await?;
        patch.apply(&mut item);
        item.check_target().map_err(AppError::BadRequest)?;
        if let Some(parent_id) = item.parent_id {
            self.check_parent(&item, parent_id).await?;
        }

        let item = self
            .storage
            .update_menu_item(item)
            .await?
            .ok_or_else(|| AppError::not_found("menu item"))?;
        self.invalidate();
        info!(item_id = id, "menu item updated");
        Ok(item)
    }

    /// Delete an item and everything nested under it.
    pub async fn delete_item(&self, id: i32) -> AppResult<()> {
        if !self.storage.delete_menu_item(id).await? {
            return Err(AppError::not_found("menu item"));
        }
        self.invalidate();
        info!(item_id = id, "menu item deleted");
        Ok(())
    }

    async fn ensure_location_free(&self, location: MenuLocation, except: Option<i32>) -> AppResult<()> {
        match self.storage.get_menu_by_location(location).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::BadRequest(format!(
                "a menu already exists for location {location}"
            ))),
            _ => Ok(()),
        }
    }

    /// The parent must live in the same menu and must not be the item itself
    /// or one of its descendants.
    async fn check_parent(&self, item: &MenuItem, parent_id: i32) -> AppResult<()> {
        let siblings = self.storage.list_menu_items(item.menu_id).await?;
        let parents: HashMap<i32, Option<i32>> =
            siblings.iter().map(|i| (i.id, i.parent_id)).collect();

        if !parents.contains_key(&parent_id) {
            return Err(AppError::BadRequest(
                "parent item must belong to the same menu".to_string(),
            ));
        }

        if item.id != 0 && creates_cycle(&parents, item.id, parent_id) {
            return Err(AppError::BadRequest(
                "a menu item cannot be nested under itself or its descendants".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whether making `parent_id` the parent of `item_id` would close a loop.
fn creates_cycle(parents: &HashMap<i32, Option<i32>>, item_id: i32, parent_id: i32) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if id == item_id {
            return true;
        }
        if !seen.insert(id) {
            // pre-existing loop above the new parent
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}
