//! Persistence layer.
//!
//! Each entity has its own store trait; [`Storage`] composes them so the
//! rest of the crate holds a single `Arc<dyn Storage>`. Two backends exist:
//! [`PgStorage`] over PostgreSQL and [`MemStorage`] for database-less runs
//! and the test suite.
//!
//! Stores deal in whole records. Validation, slug uniqueness and partial
//! merging happen above this layer.

mod memory;
mod postgres;

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    EntityCounts, Media, Menu, MenuItem, MenuItemType, MenuLocation, Page, Post, PostFilter, Role,
    Scholarship, ScholarshipFilter, SeoSetting, SiteSettings, Subscriber, SuccessStory, Term,
    TermKind, User,
};

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// Filter for lists that only distinguish published state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub is_published: Option<bool>,
    pub limit: Option<u32>,
}

/// Display data of an entity a menu item points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub label: String,
    /// Only taxonomy terms carry icons.
    pub icon: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User>;
    /// Returns `None` when the user no longer exists.
    async fn update_user(&self, user: User) -> Result<Option<User>>;
    async fn get_user(&self, id: i32) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn delete_user(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn insert_role(&self, role: Role) -> Result<Role>;
    async fn update_role(&self, role: Role) -> Result<Option<Role>>;
    async fn get_role(&self, id: i32) -> Result<Option<Role>>;
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    async fn get_default_role(&self) -> Result<Option<Role>>;
    async fn list_roles(&self) -> Result<Vec<Role>>;
    /// Make `id` the only default role. Returns false if the role is missing.
    async fn set_default_role(&self, id: i32) -> Result<bool>;
    /// Delete a role and move its users to `reassign_to` in one step.
    async fn delete_role(&self, id: i32, reassign_to: Option<i32>) -> Result<bool>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn insert_menu(&self, menu: Menu) -> Result<Menu>;
    async fn update_menu(&self, menu: Menu) -> Result<Option<Menu>>;
    async fn get_menu(&self, id: i32) -> Result<Option<Menu>>;
    async fn get_menu_by_location(&self, location: MenuLocation) -> Result<Option<Menu>>;
    async fn list_menus(&self) -> Result<Vec<Menu>>;
    /// Deletes the menu together with all of its items.
    async fn delete_menu(&self, id: i32) -> Result<bool>;

    async fn insert_menu_item(&self, item: MenuItem) -> Result<MenuItem>;
    async fn update_menu_item(&self, item: MenuItem) -> Result<Option<MenuItem>>;
    async fn get_menu_item(&self, id: i32) -> Result<Option<MenuItem>>;
    /// Every item of a menu, active or not, in one call.
    async fn list_menu_items(&self, menu_id: i32) -> Result<Vec<MenuItem>>;
    /// Deletes the item together with its descendants.
    async fn delete_menu_item(&self, id: i32) -> Result<bool>;

    /// Look up display data for the entities menu items reference. Missing
    /// targets are simply absent from the result.
    async fn resolve_targets(
        &self,
        targets: &[(MenuItemType, i32)],
    ) -> Result<HashMap<(MenuItemType, i32), TargetInfo>>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    async fn insert_page(&self, page: Page) -> Result<Page>;
    async fn update_page(&self, page: Page) -> Result<Option<Page>>;
    async fn get_page(&self, id: i32) -> Result<Option<Page>>;
    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>>;
    async fn list_pages(&self, filter: ListFilter) -> Result<Vec<Page>>;
    async fn delete_page(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait ScholarshipStore: Send + Sync {
    async fn insert_scholarship(&self, scholarship: Scholarship) -> Result<Scholarship>;
    async fn update_scholarship(&self, scholarship: Scholarship) -> Result<Option<Scholarship>>;
    async fn get_scholarship(&self, id: i32) -> Result<Option<Scholarship>>;
    async fn get_scholarship_by_slug(&self, slug: &str) -> Result<Option<Scholarship>>;
    async fn list_scholarships(&self, filter: &ScholarshipFilter) -> Result<Vec<Scholarship>>;
    async fn delete_scholarship(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: Post) -> Result<Post>;
    async fn update_post(&self, post: Post) -> Result<Option<Post>>;
    async fn get_post(&self, id: i32) -> Result<Option<Post>>;
    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>>;
    async fn delete_post(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait TermStore: Send + Sync {
    async fn insert_term(&self, kind: TermKind, term: Term) -> Result<Term>;
    async fn update_term(&self, kind: TermKind, term: Term) -> Result<Option<Term>>;
    async fn get_term(&self, kind: TermKind, id: i32) -> Result<Option<Term>>;
    async fn get_term_by_slug(&self, kind: TermKind, slug: &str) -> Result<Option<Term>>;
    /// Terms ordered by display order, then name.
    async fn list_terms(&self, kind: TermKind) -> Result<Vec<Term>>;
    async fn delete_term(&self, kind: TermKind, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait SuccessStoryStore: Send + Sync {
    async fn insert_story(&self, story: SuccessStory) -> Result<SuccessStory>;
    async fn update_story(&self, story: SuccessStory) -> Result<Option<SuccessStory>>;
    async fn get_story(&self, id: i32) -> Result<Option<SuccessStory>>;
    async fn list_stories(&self, filter: ListFilter) -> Result<Vec<SuccessStory>>;
    async fn delete_story(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber>;
    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<Option<Subscriber>>;
    async fn get_subscriber(&self, id: i32) -> Result<Option<Subscriber>>;
    /// `email` must already be normalized.
    async fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>>;
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>>;
    async fn delete_subscriber(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait SeoStore: Send + Sync {
    async fn insert_seo(&self, seo: SeoSetting) -> Result<SeoSetting>;
    async fn update_seo(&self, seo: SeoSetting) -> Result<Option<SeoSetting>>;
    async fn get_seo(&self, id: i32) -> Result<Option<SeoSetting>>;
    async fn get_seo_by_path(&self, path: &str) -> Result<Option<SeoSetting>>;
    async fn list_seo(&self) -> Result<Vec<SeoSetting>>;
    async fn delete_seo(&self, id: i32) -> Result<bool>;
}

#[async_trait]
pub trait SiteSettingsStore: Send + Sync {
    async fn get_site_settings(&self) -> Result<Option<SiteSettings>>;
    /// Insert the singleton row or overwrite it.
    async fn save_site_settings(&self, settings: SiteSettings) -> Result<SiteSettings>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert_media(&self, media: Media) -> Result<Media>;
    async fn update_media(&self, media: Media) -> Result<Option<Media>>;
    async fn get_media(&self, id: i32) -> Result<Option<Media>>;
    async fn list_media(&self) -> Result<Vec<Media>>;
    /// Returns the removed record so its file can be cleaned up.
    async fn delete_media(&self, id: i32) -> Result<Option<Media>>;
}

/// The full persistence surface.
#[async_trait]
pub trait Storage:
    UserStore
    + RoleStore
    + MenuStore
    + PageStore
    + ScholarshipStore
    + PostStore
    + TermStore
    + SuccessStoryStore
    + SubscriberStore
    + SeoStore
    + SiteSettingsStore
    + MediaStore
{
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn healthy(&self) -> bool;

    async fn counts(&self) -> Result<EntityCounts>;
}

/// Item types whose targets live in a taxonomy table.
pub(crate) fn term_kind_for(item_type: MenuItemType) -> Option<TermKind> {
    match item_type {
        MenuItemType::Category => Some(TermKind::Category),
        MenuItemType::Level => Some(TermKind::Level),
        MenuItemType::Country => Some(TermKind::Country),
        _ => None,
    }
}

/// Apply an optional limit to an already ordered list.
pub(crate) fn take_limit<T>(mut rows: Vec<T>, limit: Option<u32>) -> Vec<T> {
    if let Some(limit) = limit {
        rows.truncate(limit as usize);
    }
    rows
}
