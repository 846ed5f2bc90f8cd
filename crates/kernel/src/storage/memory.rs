//! In-process storage backend.
//!
//! Used when no database is configured and by the integration tests. Each
//! entity lives in a [`Table`]: a `BTreeMap` keyed by id behind a
//! `parking_lot` lock, with ids handed out by an atomic counter.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::{
    ListFilter, MediaStore, MenuStore, PageStore, PostStore, RoleStore, ScholarshipStore,
    SeoStore, SiteSettingsStore, Storage, SubscriberStore, SuccessStoryStore, TargetInfo,
    TermStore, UserStore, take_limit, term_kind_for,
};
use crate::models::{
    EntityCounts, Media, Menu, MenuItem, MenuItemType, MenuLocation, Page, Post, PostFilter,
    Record, Role, Scholarship, ScholarshipFilter, SeoSetting, SiteSettings, Subscriber,
    SuccessStory, Term, TermKind, User,
};

struct Table<T> {
    rows: RwLock<BTreeMap<i32, T>>,
    next_id: AtomicI32,
}

impl<T: Record> Table<T> {
    fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(0),
        }
    }

    fn insert(&self, mut row: T) -> T {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        row.set_id(id);
        self.rows.write().insert(id, row.clone());
        row
    }

    fn update(&self, row: T) -> Option<T> {
        let mut rows = self.rows.write();
        let slot = rows.get_mut(&row.id())?;
        *slot = row.clone();
        Some(row)
    }

    fn get(&self, id: i32) -> Option<T> {
        self.rows.read().get(&id).cloned()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.read().values().find(|r| pred(r)).cloned()
    }

    /// Matching rows in ascending id order.
    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.read().values().filter(|r| pred(r)).cloned().collect()
    }

    /// Matching rows, newest first.
    fn newest(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .read()
            .values()
            .rev()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<T> {
        self.filter(|_| true)
    }

    fn remove(&self, id: i32) -> Option<T> {
        self.rows.write().remove(&id)
    }

    fn count(&self, pred: impl Fn(&T) -> bool) -> i64 {
        self.rows.read().values().filter(|r| pred(r)).count() as i64
    }
}

/// Storage backed by process memory. Contents are lost on restart.
pub struct MemStorage {
    users: Table<User>,
    roles: Table<Role>,
    menus: Table<Menu>,
    menu_items: Table<MenuItem>,
    pages: Table<Page>,
    scholarships: Table<Scholarship>,
    posts: Table<Post>,
    categories: Table<Term>,
    levels: Table<Term>,
    countries: Table<Term>,
    tags: Table<Term>,
    stories: Table<SuccessStory>,
    subscribers: Table<Subscriber>,
    seo: Table<SeoSetting>,
    media: Table<Media>,
    site_settings: RwLock<Option<SiteSettings>>,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            users: Table::new(),
            roles: Table::new(),
            menus: Table::new(),
            menu_items: Table::new(),
            pages: Table::new(),
            scholarships: Table::new(),
            posts: Table::new(),
            categories: Table::new(),
            levels: Table::new(),
            countries: Table::new(),
            tags: Table::new(),
            stories: Table::new(),
            subscribers: Table::new(),
            seo: Table::new(),
            media: Table::new(),
            site_settings: RwLock::new(None),
        }
    }

    fn terms(&self, kind: TermKind) -> &Table<Term> {
        match kind {
            TermKind::Category => &self.categories,
            TermKind::Level => &self.levels,
            TermKind::Country => &self.countries,
            TermKind::Tag => &self.tags,
        }
    }

    fn target_info(&self, item_type: MenuItemType, id: i32) -> Option<TargetInfo> {
        if let Some(kind) = term_kind_for(item_type) {
            return self.terms(kind).get(id).map(|t| TargetInfo {
                label: t.name,
                icon: t.icon,
            });
        }
        let label = match item_type {
            MenuItemType::Page => self.pages.get(id)?.title,
            MenuItemType::Scholarship => self.scholarships.get(id)?.title,
            MenuItemType::Post => self.posts.get(id)?.title,
            _ => return None,
        };
        Some(TargetInfo { label, icon: None })
    }
}

#[async_trait]
impl UserStore for MemStorage {
    async fn insert_user(&self, user: User) -> Result<User> {
        Ok(self.users.insert(user))
    }

    async fn update_user(&self, user: User) -> Result<Option<User>> {
        Ok(self.users.update(user))
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.find(|u| u.username == username))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.users.all())
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        Ok(self.users.remove(id).is_some())
    }
}

#[async_trait]
impl RoleStore for MemStorage {
    async fn insert_role(&self, role: Role) -> Result<Role> {
        Ok(self.roles.insert(role))
    }

    async fn update_role(&self, role: Role) -> Result<Option<Role>> {
        Ok(self.roles.update(role))
    }

    async fn get_role(&self, id: i32) -> Result<Option<Role>> {
        Ok(self.roles.get(id))
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.roles.find(|r| r.name.eq_ignore_ascii_case(name)))
    }

    async fn get_default_role(&self) -> Result<Option<Role>> {
        Ok(self.roles.find(|r| r.is_default))
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.roles.all())
    }

    async fn set_default_role(&self, id: i32) -> Result<bool> {
        let mut roles = self.roles.rows.write();
        if !roles.contains_key(&id) {
            return Ok(false);
        }
        for role in roles.values_mut() {
            role.is_default = role.id == id;
        }
        Ok(true)
    }

    async fn delete_role(&self, id: i32, reassign_to: Option<i32>) -> Result<bool> {
        if self.roles.remove(id).is_none() {
            return Ok(false);
        }
        let mut users = self.users.rows.write();
        for user in users.values_mut().filter(|u| u.role_id == Some(id)) {
            user.role_id = reassign_to;
        }
        Ok(true)
    }
}

#[async_trait]
impl MenuStore for MemStorage {
    async fn insert_menu(&self, menu: Menu) -> Result<Menu> {
        Ok(self.menus.insert(menu))
    }

    async fn update_menu(&self, menu: Menu) -> Result<Option<Menu>> {
        Ok(self.menus.update(menu))
    }

    async fn get_menu(&self, id: i32) -> Result<Option<Menu>> {
        Ok(self.menus.get(id))
    }

    async fn get_menu_by_location(&self, location: MenuLocation) -> Result<Option<Menu>> {
        Ok(self.menus.find(|m| m.location == location))
    }

    async fn list_menus(&self) -> Result<Vec<Menu>> {
        Ok(self.menus.all())
    }

    async fn delete_menu(&self, id: i32) -> Result<bool> {
        if self.menus.remove(id).is_none() {
            return Ok(false);
        }
        self.menu_items.rows.write().retain(|_, item| item.menu_id != id);
        Ok(true)
    }

    async fn insert_menu_item(&self, item: MenuItem) -> Result<MenuItem> {
        Ok(self.menu_items.insert(item))
    }

    async fn update_menu_item(&self, item: MenuItem) -> Result<Option<MenuItem>> {
        Ok(self.menu_items.update(item))
    }

    async fn get_menu_item(&self, id: i32) -> Result<Option<MenuItem>> {
        Ok(self.menu_items.get(id))
    }

    async fn list_menu_items(&self, menu_id: i32) -> Result<Vec<MenuItem>> {
        Ok(self.menu_items.filter(|i| i.menu_id == menu_id))
    }

    async fn delete_menu_item(&self, id: i32) -> Result<bool> {
        let mut items = self.menu_items.rows.write();
        if !items.contains_key(&id) {
            return Ok(false);
        }

        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for item in items.values() {
                if item.parent_id.is_some_and(|p| doomed.contains(&p)) {
                    doomed.insert(item.id);
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        items.retain(|item_id, _| !doomed.contains(item_id));
        Ok(true)
    }

    async fn resolve_targets(
        &self,
        targets: &[(MenuItemType, i32)],
    ) -> Result<HashMap<(MenuItemType, i32), TargetInfo>> {
        Ok(targets
            .iter()
            .filter_map(|&(item_type, id)| {
                self.target_info(item_type, id)
                    .map(|info| ((item_type, id), info))
            })
            .collect())
    }
}

#[async_trait]
impl PageStore for MemStorage {
    async fn insert_page(&self, page: Page) -> Result<Page> {
        Ok(self.pages.insert(page))
    }

    async fn update_page(&self, page: Page) -> Result<Option<Page>> {
        Ok(self.pages.update(page))
    }

    async fn get_page(&self, id: i32) -> Result<Option<Page>> {
        Ok(self.pages.get(id))
    }

    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        Ok(self.pages.find(|p| p.slug == slug))
    }

    async fn list_pages(&self, filter: ListFilter) -> Result<Vec<Page>> {
        let rows = self
            .pages
            .newest(|p| filter.is_published.is_none_or(|v| p.is_published == v));
        Ok(take_limit(rows, filter.limit))
    }

    async fn delete_page(&self, id: i32) -> Result<bool> {
        Ok(self.pages.remove(id).is_some())
    }
}

#[async_trait]
impl ScholarshipStore for MemStorage {
    async fn insert_scholarship(&self, scholarship: Scholarship) -> Result<Scholarship> {
        Ok(self.scholarships.insert(scholarship))
    }

    async fn update_scholarship(&self, scholarship: Scholarship) -> Result<Option<Scholarship>> {
        Ok(self.scholarships.update(scholarship))
    }

    async fn get_scholarship(&self, id: i32) -> Result<Option<Scholarship>> {
        Ok(self.scholarships.get(id))
    }

    async fn get_scholarship_by_slug(&self, slug: &str) -> Result<Option<Scholarship>> {
        Ok(self.scholarships.find(|s| s.slug == slug))
    }

    async fn list_scholarships(&self, filter: &ScholarshipFilter) -> Result<Vec<Scholarship>> {
        let rows = self.scholarships.newest(|s| filter.matches(s));
        Ok(take_limit(rows, filter.limit))
    }

    async fn delete_scholarship(&self, id: i32) -> Result<bool> {
        Ok(self.scholarships.remove(id).is_some())
    }
}

#[async_trait]
impl PostStore for MemStorage {
    async fn insert_post(&self, post: Post) -> Result<Post> {
        Ok(self.posts.insert(post))
    }

    async fn update_post(&self, post: Post) -> Result<Option<Post>> {
        Ok(self.posts.update(post))
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        Ok(self.posts.get(id))
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self.posts.find(|p| p.slug == slug))
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let rows = self.posts.newest(|p| filter.matches(p));
        Ok(take_limit(rows, filter.limit))
    }

    async fn delete_post(&self, id: i32) -> Result<bool> {
        Ok(self.posts.remove(id).is_some())
    }
}

#[async_trait]
impl TermStore for MemStorage {
    async fn insert_term(&self, kind: TermKind, term: Term) -> Result<Term> {
        Ok(self.terms(kind).insert(term))
    }

    async fn update_term(&self, kind: TermKind, term: Term) -> Result<Option<Term>> {
        Ok(self.terms(kind).update(term))
    }

    async fn get_term(&self, kind: TermKind, id: i32) -> Result<Option<Term>> {
        Ok(self.terms(kind).get(id))
    }

    async fn get_term_by_slug(&self, kind: TermKind, slug: &str) -> Result<Option<Term>> {
        Ok(self.terms(kind).find(|t| t.slug == slug))
    }

    async fn list_terms(&self, kind: TermKind) -> Result<Vec<Term>> {
        let mut terms = self.terms(kind).all();
        terms.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(terms)
    }

    async fn delete_term(&self, kind: TermKind, id: i32) -> Result<bool> {
        Ok(self.terms(kind).remove(id).is_some())
    }
}

#[async_trait]
impl SuccessStoryStore for MemStorage {
    async fn insert_story(&self, story: SuccessStory) -> Result<SuccessStory> {
        Ok(self.stories.insert(story))
    }

    async fn update_story(&self, story: SuccessStory) -> Result<Option<SuccessStory>> {
        Ok(self.stories.update(story))
    }

    async fn get_story(&self, id: i32) -> Result<Option<SuccessStory>> {
        Ok(self.stories.get(id))
    }

    async fn list_stories(&self, filter: ListFilter) -> Result<Vec<SuccessStory>> {
        let rows = self
            .stories
            .newest(|s| filter.is_published.is_none_or(|v| s.is_published == v));
        Ok(take_limit(rows, filter.limit))
    }

    async fn delete_story(&self, id: i32) -> Result<bool> {
        Ok(self.stories.remove(id).is_some())
    }
}

#[async_trait]
impl SubscriberStore for MemStorage {
    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber> {
        Ok(self.subscribers.insert(subscriber))
    }

    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<Option<Subscriber>> {
        Ok(self.subscribers.update(subscriber))
    }

    async fn get_subscriber(&self, id: i32) -> Result<Option<Subscriber>> {
        Ok(self.subscribers.get(id))
    }

    async fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        Ok(self.subscribers.find(|s| s.email == email))
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.newest(|_| true))
    }

    async fn delete_subscriber(&self, id: i32) -> Result<bool> {
        Ok(self.subscribers.remove(id).is_some())
    }
}

#[async_trait]
impl SeoStore for MemStorage {
    async fn insert_seo(&self, seo: SeoSetting) -> Result<SeoSetting> {
        Ok(self.seo.insert(seo))
    }

    async fn update_seo(&self, seo: SeoSetting) -> Result<Option<SeoSetting>> {
        Ok(self.seo.update(seo))
    }

    async fn get_seo(&self, id: i32) -> Result<Option<SeoSetting>> {
        Ok(self.seo.get(id))
    }

    async fn get_seo_by_path(&self, path: &str) -> Result<Option<SeoSetting>> {
        Ok(self.seo.find(|s| s.page_path == path))
    }

    async fn list_seo(&self) -> Result<Vec<SeoSetting>> {
        let mut rows = self.seo.all();
        rows.sort_by(|a, b| a.page_path.cmp(&b.page_path));
        Ok(rows)
    }

    async fn delete_seo(&self, id: i32) -> Result<bool> {
        Ok(self.seo.remove(id).is_some())
    }
}

#[async_trait]
impl SiteSettingsStore for MemStorage {
    async fn get_site_settings(&self) -> Result<Option<SiteSettings>> {
        Ok(self.site_settings.read().clone())
    }

    async fn save_site_settings(&self, mut settings: SiteSettings) -> Result<SiteSettings> {
        settings.id = 1;
        *self.site_settings.write() = Some(settings.clone());
        Ok(settings)
    }
}

#[async_trait]
impl MediaStore for MemStorage {
    async fn insert_media(&self, media: Media) -> Result<Media> {
        Ok(self.media.insert(media))
    }

    async fn update_media(&self, media: Media) -> Result<Option<Media>> {
        Ok(self.media.update(media))
    }

    async fn get_media(&self, id: i32) -> Result<Option<Media>> {
        Ok(self.media.get(id))
    }

    async fn list_media(&self) -> Result<Vec<Media>> {
        Ok(self.media.newest(|_| true))
    }

    async fn delete_media(&self, id: i32) -> Result<Option<Media>> {
        Ok(self.media.remove(id))
    }
}

#[async_trait]
impl Storage for MemStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn healthy(&self) -> bool {
        true
    }

    async fn counts(&self) -> Result<EntityCounts> {
        Ok(EntityCounts {
            scholarships: self.scholarships.count(|_| true),
            published_scholarships: self.scholarships.count(|s| s.is_published),
            posts: self.posts.count(|_| true),
            pages: self.pages.count(|_| true),
            categories: self.categories.count(|_| true),
            levels: self.levels.count(|_| true),
            countries: self.countries.count(|_| true),
            tags: self.tags.count(|_| true),
            success_stories: self.stories.count(|_| true),
            subscribers: self.subscribers.count(|_| true),
            media: self.media.count(|_| true),
            users: self.users.count(|_| true),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{CreateMenu, CreateMenuItem, CreateRole, CreateTerm};

    fn item(menu_id: i32, parent_id: Option<i32>) -> MenuItem {
        let mut input: CreateMenuItem = serde_json::from_str(r##"{"type":"link","url":"#"}"##).unwrap();
        input.parent_id = parent_id;
        input.into_record(menu_id)
    }

    #[tokio::test]
    async fn ids_are_sequential_per_table() {
        let store = MemStorage::new();
        let a = store.insert_role(role("A")).await.unwrap();
        let b = store.insert_role(role("B")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    fn role(name: &str) -> Role {
        CreateRole {
            name: name.into(),
            description: None,
            permissions: vec![],
            is_default: false,
        }
        .into_record()
    }

    #[tokio::test]
    async fn deleting_an_item_removes_its_descendants() {
        let store = MemStorage::new();
        let menu: CreateMenu = serde_json::from_str(r#"{"name":"Main","location":"header"}"#).unwrap();
        let menu = store.insert_menu(menu.into_record()).await.unwrap();

        let root = store.insert_menu_item(item(menu.id, None)).await.unwrap();
        let child = store.insert_menu_item(item(menu.id, Some(root.id))).await.unwrap();
        let grandchild = store
            .insert_menu_item(item(menu.id, Some(child.id)))
            .await
            .unwrap();
        let sibling = store.insert_menu_item(item(menu.id, None)).await.unwrap();

        assert!(store.delete_menu_item(root.id).await.unwrap());
        assert!(store.get_menu_item(grandchild.id).await.unwrap().is_none());
        let left = store.list_menu_items(menu.id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, sibling.id);

        assert!(store.delete_menu(menu.id).await.unwrap());
        assert!(store.list_menu_items(menu.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_default_role_is_exclusive() {
        let store = MemStorage::new();
        let a = store.insert_role(role("A")).await.unwrap();
        let b = store.insert_role(role("B")).await.unwrap();

        assert!(store.set_default_role(a.id).await.unwrap());
        assert!(store.set_default_role(b.id).await.unwrap());
        assert!(!store.get_role(a.id).await.unwrap().unwrap().is_default);
        assert_eq!(store.get_default_role().await.unwrap().unwrap().id, b.id);
        assert!(!store.set_default_role(99).await.unwrap());
    }

    #[tokio::test]
    async fn resolve_targets_skips_missing_entities() {
        let store = MemStorage::new();
        let input: CreateTerm =
            serde_json::from_str(r#"{"name":"Engineering","icon":"cog"}"#).unwrap();
        let category = store
            .insert_term(TermKind::Category, input.into_record("engineering".into()))
            .await
            .unwrap();

        let resolved = store
            .resolve_targets(&[
                (MenuItemType::Category, category.id),
                (MenuItemType::Category, 42),
                (MenuItemType::Page, 1),
            ])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 1);
        let info = &resolved[&(MenuItemType::Category, category.id)];
        assert_eq!(info.label, "Engineering");
        assert_eq!(info.icon.as_deref(), Some("cog"));
    }
}
