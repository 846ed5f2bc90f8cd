//! Permission catalog and permission checking with DashMap-based caching.
//!
//! Permissions are `<area>.<action>` strings from a fixed catalog. A role is
//! a set of them; a user holds at most one role and falls back to the
//! default role when none is assigned.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use serde::Serialize;

use crate::models::User;
use crate::storage::Storage;

/// One grantable permission.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PermissionDef {
    pub id: &'static str,
    pub label: &'static str,
}

/// Permissions of one feature area.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PermissionGroup {
    pub area: &'static str,
    pub label: &'static str,
    pub permissions: &'static [PermissionDef],
}

const fn p(id: &'static str, label: &'static str) -> PermissionDef {
    PermissionDef { id, label }
}

/// The complete permission catalog, grouped by area.
pub const CATALOG: &[PermissionGroup] = &[
    PermissionGroup {
        area: "dashboard",
        label: "Dashboard",
        permissions: &[p("dashboard.view", "View dashboard statistics")],
    },
    PermissionGroup {
        area: "scholarships",
        label: "Scholarships",
        permissions: &[
            p("scholarships.view", "View unpublished scholarships"),
            p("scholarships.create", "Create scholarships"),
            p("scholarships.edit", "Edit scholarships"),
            p("scholarships.delete", "Delete scholarships"),
        ],
    },
    PermissionGroup {
        area: "categories",
        label: "Categories",
        permissions: &[
            p("categories.create", "Create categories"),
            p("categories.edit", "Edit categories"),
            p("categories.delete", "Delete categories"),
        ],
    },
    PermissionGroup {
        area: "levels",
        label: "Study levels",
        permissions: &[
            p("levels.create", "Create levels"),
            p("levels.edit", "Edit levels"),
            p("levels.delete", "Delete levels"),
        ],
    },
    PermissionGroup {
        area: "countries",
        label: "Countries",
        permissions: &[
            p("countries.create", "Create countries"),
            p("countries.edit", "Edit countries"),
            p("countries.delete", "Delete countries"),
        ],
    },
    PermissionGroup {
        area: "tags",
        label: "Tags",
        permissions: &[
            p("tags.create", "Create tags"),
            p("tags.edit", "Edit tags"),
            p("tags.delete", "Delete tags"),
        ],
    },
    PermissionGroup {
        area: "posts",
        label: "Articles",
        permissions: &[
            p("posts.view", "View unpublished articles"),
            p("posts.create", "Create articles"),
            p("posts.edit", "Edit articles"),
            p("posts.delete", "Delete articles"),
        ],
    },
    PermissionGroup {
        area: "pages",
        label: "Pages",
        permissions: &[
            p("pages.view", "View unpublished pages"),
            p("pages.create", "Create pages"),
            p("pages.edit", "Edit pages"),
            p("pages.delete", "Delete pages"),
            p("pages.manage", "Place pages in the header and footer"),
        ],
    },
    PermissionGroup {
        area: "success_stories",
        label: "Success stories",
        permissions: &[
            p("success_stories.view", "View unpublished success stories"),
            p("success_stories.create", "Create success stories"),
            p("success_stories.edit", "Edit success stories"),
            p("success_stories.delete", "Delete success stories"),
        ],
    },
    PermissionGroup {
        area: "subscribers",
        label: "Subscribers",
        permissions: &[
            p("subscribers.view", "View subscribers"),
            p("subscribers.edit", "Edit subscribers"),
            p("subscribers.delete", "Delete subscribers"),
        ],
    },
    PermissionGroup {
        area: "media",
        label: "Media",
        permissions: &[
            p("media.view", "Browse the media library"),
            p("media.upload", "Upload files"),
            p("media.edit", "Edit media details"),
            p("media.delete", "Delete files"),
        ],
    },
    PermissionGroup {
        area: "menus",
        label: "Menus",
        permissions: &[
            p("menus.view", "View menus"),
            p("menus.create", "Create menus and items"),
            p("menus.edit", "Edit menus and items"),
            p("menus.delete", "Delete menus and items"),
        ],
    },
    PermissionGroup {
        area: "users",
        label: "Users",
        permissions: &[
            p("users.view", "View users"),
            p("users.create", "Create users"),
            p("users.edit", "Edit users and assign roles"),
            p("users.delete", "Delete users"),
        ],
    },
    PermissionGroup {
        area: "roles",
        label: "Roles",
        permissions: &[
            p("roles.view", "View roles"),
            p("roles.create", "Create roles"),
            p("roles.edit", "Edit roles and the default role"),
            p("roles.delete", "Delete roles"),
        ],
    },
    PermissionGroup {
        area: "settings",
        label: "Site settings",
        permissions: &[
            p("settings.view", "View site settings"),
            p("settings.edit", "Edit site settings"),
        ],
    },
    PermissionGroup {
        area: "seo",
        label: "SEO",
        permissions: &[
            p("seo.view", "View SEO settings"),
            p("seo.manage", "Create, edit and delete SEO settings"),
        ],
    },
];

/// Every permission id in the catalog.
pub fn all_permissions() -> impl Iterator<Item = &'static str> {
    CATALOG
        .iter()
        .flat_map(|group| group.permissions.iter().map(|p| p.id))
}

pub fn is_known(permission: &str) -> bool {
    all_permissions().any(|id| id == permission)
}

/// Ids from `permissions` that are not in the catalog.
pub fn unknown_permissions(permissions: &[String]) -> Vec<String> {
    permissions
        .iter()
        .filter(|p| !is_known(p))
        .cloned()
        .collect()
}

/// Permission service with fast DashMap-based lookups.
#[derive(Clone)]
pub struct PermissionService {
    inner: Arc<PermissionServiceInner>,
}

struct PermissionServiceInner {
    /// Cache of user_id -> effective permissions.
    user_cache: DashMap<i32, Arc<HashSet<String>>>,

    /// Role lookups on cache misses.
    storage: Arc<dyn Storage>,
}

impl PermissionService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(PermissionServiceInner {
                user_cache: DashMap::new(),
                storage,
            }),
        }
    }

    /// Check if a user has a specific permission.
    ///
    /// Admin users always pass. Everyone else is checked against their own
    /// role, or the default role when they have none.
    pub async fn user_has_permission(&self, user: &User, permission: &str) -> Result<bool> {
        if user.is_admin {
            return Ok(true);
        }
        Ok(self.effective_permissions(user).await?.contains(permission))
    }

    /// The set of permissions a user holds, cached per user.
    pub async fn effective_permissions(&self, user: &User) -> Result<Arc<HashSet<String>>> {
        if user.is_admin {
            return Ok(Arc::new(all_permissions().map(str::to_string).collect()));
        }

        if let Some(cached) = self.inner.user_cache.get(&user.id) {
            return Ok(Arc::clone(cached.value()));
        }

        let permissions = Arc::new(self.load_user_permissions(user).await?);
        self.inner
            .user_cache
            .insert(user.id, Arc::clone(&permissions));
        Ok(permissions)
    }

    async fn load_user_permissions(&self, user: &User) -> Result<HashSet<String>> {
        let storage = &self.inner.storage;

        let mut role = match user.role_id {
            Some(role_id) => storage.get_role(role_id).await?,
            None => None,
        };
        if role.is_none() {
            role = storage.get_default_role().await?;
        }

        Ok(role
            .map(|r| r.permissions.into_iter().collect())
            .unwrap_or_default())
    }

    /// Call when a user's role assignment changes.
    pub fn invalidate_user(&self, user_id: i32) {
        self.inner.user_cache.remove(&user_id);
    }

    /// Call when any role changes.
    pub fn invalidate_all(&self) {
        self.inner.user_cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.inner.user_cache.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{CreateRole, CreateUser};
    use crate::storage::{MemStorage, RoleStore, UserStore};

    #[test]
    fn catalog_ids_are_unique_and_prefixed_by_area() {
        let mut seen = HashSet::new();
        for group in CATALOG {
            for permission in group.permissions {
                assert!(seen.insert(permission.id), "duplicate {}", permission.id);
                let (area, action) = permission.id.split_once('.').unwrap();
                assert_eq!(area, group.area);
                assert!(!action.is_empty());
            }
        }
        assert!(is_known("pages.manage"));
        assert!(!is_known("pages.publish"));
    }

    #[test]
    fn unknown_permissions_are_reported() {
        let input = vec!["posts.edit".to_string(), "posts.fly".to_string()];
        assert_eq!(unknown_permissions(&input), vec!["posts.fly"]);
    }

    async fn user(storage: &MemStorage, role_id: Option<i32>, is_admin: bool) -> User {
        let input = CreateUser {
            username: format!("user{}", role_id.unwrap_or(0)),
            email: None,
            password: "password123".into(),
            role_id,
            is_admin,
        };
        storage.insert_user(input.into_record().unwrap()).await.unwrap()
    }

    async fn role(storage: &MemStorage, name: &str, permissions: &[&str]) -> i32 {
        let input = CreateRole {
            name: name.into(),
            description: None,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            is_default: false,
        };
        storage.insert_role(input.into_record()).await.unwrap().id
    }

    #[tokio::test]
    async fn users_without_role_fall_back_to_default_role() {
        let storage = Arc::new(MemStorage::new());
        let viewer = role(&storage, "Viewer", &["dashboard.view"]).await;
        storage.set_default_role(viewer).await.unwrap();
        let editor = role(&storage, "Editor", &["posts.edit"]).await;

        let service = PermissionService::new(storage.clone());
        let plain = user(&storage, None, false).await;
        let assigned = user(&storage, Some(editor), false).await;
        let admin = user(&storage, None, true).await;

        assert!(service.user_has_permission(&plain, "dashboard.view").await.unwrap());
        assert!(!service.user_has_permission(&plain, "posts.edit").await.unwrap());
        assert!(service.user_has_permission(&assigned, "posts.edit").await.unwrap());
        assert!(!service.user_has_permission(&assigned, "dashboard.view").await.unwrap());
        assert!(service.user_has_permission(&admin, "roles.delete").await.unwrap());
    }

    #[tokio::test]
    async fn cache_serves_stale_sets_until_invalidated() {
        let storage = Arc::new(MemStorage::new());
        let editor = role(&storage, "Editor", &["posts.edit"]).await;
        let service = PermissionService::new(storage.clone());
        let u = user(&storage, Some(editor), false).await;

        assert!(service.user_has_permission(&u, "posts.edit").await.unwrap());
        assert_eq!(service.cache_size(), 1);

        let mut r = storage.get_role(editor).await.unwrap().unwrap();
        r.permissions = vec!["posts.delete".into()];
        storage.update_role(r).await.unwrap();

        assert!(service.user_has_permission(&u, "posts.edit").await.unwrap());
        service.invalidate_all();
        assert!(!service.user_has_permission(&u, "posts.edit").await.unwrap());
        assert!(service.user_has_permission(&u, "posts.delete").await.unwrap());
    }
}
