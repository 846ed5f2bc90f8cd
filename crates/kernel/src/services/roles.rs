//! Role management: creation, permission sets, the default role and user
//! assignment.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateRole, Role, UpdateRole, User};
use crate::permissions::{PermissionService, unknown_permissions};
use crate::storage::Storage;

pub struct RoleService {
    storage: Arc<dyn Storage>,
    permissions: PermissionService,
}

impl RoleService {
    pub fn new(storage: Arc<dyn Storage>, permissions: PermissionService) -> Self {
        Self {
            storage,
            permissions,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<Role>> {
        Ok(self.storage.list_roles().await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<Role> {
        self.storage
            .get_role(id)
            .await?
            .ok_or_else(|| AppError::not_found("role"))
    }

    pub async fn create(&self, input: CreateRole) -> AppResult<Role> {
        input.validate()?;
        check_catalog(&input.permissions)?;
        self.ensure_name_free(&input.name, None).await?;

        let make_default = input.is_default;
        let mut role = self.storage.insert_role(input.into_record()).await?;
        if make_default {
            self.storage.set_default_role(role.id).await?;
            role.is_default = true;
        }

        self.permissions.invalidate_all();
        info!(role_id = role.id, name = %role.name, default = role.is_default, "role created");
        Ok(role)
    }

    pub async fn update(&self, id: i32, patch: UpdateRole) -> AppResult<Role> {
        patch.validate()?;
        if let Some(permissions) = &patch.permissions {
            check_catalog(permissions)?;
        }
        if let Some(name) = &patch.name {
            self.ensure_name_free(name, Some(id)).await?;
        }

        let mut role = self.get(id).await?;
        patch.apply(&mut role);
        let role = self
            .storage
            .update_role(role)
            .await?
            .ok_or_else(|| AppError::not_found("role"))?;

        self.permissions.invalidate_all();
        info!(role_id = id, "role updated");
        Ok(role)
    }

    /// Delete a role, moving its users to the default role.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let role = self.get(id).await?;
        if role.is_default {
            return Err(AppError::BadRequest(
                "the default role cannot be deleted; make another role the default first"
                    .to_string(),
            ));
        }

        let fallback = self.storage.get_default_role().await?.map(|r| r.id);
        if !self.storage.delete_role(id, fallback).await? {
            return Err(AppError::not_found("role"));
        }

        self.permissions.invalidate_all();
        info!(role_id = id, reassigned_to = ?fallback, "role deleted");
        Ok(())
    }

    /// Make `id` the only default role.
    pub async fn set_default(&self, id: i32) -> AppResult<Role> {
        if !self.storage.set_default_role(id).await? {
            return Err(AppError::not_found("role"));
        }
        self.permissions.invalidate_all();
        info!(role_id = id, "default role changed");
        self.get(id).await
    }

    /// Assign a role to a user, or clear it so the default applies.
    pub async fn assign(&self, user_id: i32, role_id: Option<i32>) -> AppResult<User> {
        let mut user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;
        if let Some(role_id) = role_id {
            self.get(role_id).await?;
        }

        user.role_id = role_id;
        user.updated_at = chrono::Utc::now();
        let user = self
            .storage
            .update_user(user)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        self.permissions.invalidate_user(user_id);
        info!(user_id, role_id = ?role_id, "role assigned");
        Ok(user)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i32>) -> AppResult<()> {
        match self.storage.get_role_by_name(name.trim()).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::BadRequest(format!(
                "a role named '{}' already exists",
                existing.name
            ))),
            _ => Ok(()),
        }
    }
}

fn check_catalog(permissions: &[String]) -> AppResult<()> {
    let unknown = unknown_permissions(permissions);
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "unknown permissions: {}",
            unknown.join(", ")
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CreateUser;
    use crate::storage::{MemStorage, UserStore};

    fn service() -> (Arc<MemStorage>, RoleService) {
        let storage = Arc::new(MemStorage::new());
        let permissions = PermissionService::new(storage.clone());
        (storage.clone(), RoleService::new(storage, permissions))
    }

    fn role(name: &str, permissions: &[&str], is_default: bool) -> CreateRole {
        CreateRole {
            name: name.into(),
            description: None,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            is_default,
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_permissions_and_duplicates() {
        let (_, roles) = service();
        let err = roles
            .create(role("Editor", &["posts.edit", "posts.teleport"], false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("posts.teleport")));

        roles.create(role("Editor", &["posts.edit"], false)).await.unwrap();
        let dup = roles.create(role("editor", &[], false)).await.unwrap_err();
        assert!(matches!(dup, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn default_flag_moves_between_roles() {
        let (_, roles) = service();
        let a = roles.create(role("A", &[], true)).await.unwrap();
        assert!(a.is_default);
        let b = roles.create(role("B", &[], false)).await.unwrap();

        roles.set_default(b.id).await.unwrap();
        assert!(!roles.get(a.id).await.unwrap().is_default);
        assert!(roles.get(b.id).await.unwrap().is_default);

        assert!(matches!(roles.set_default(404).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_reassigns_users_to_default_role() {
        let (storage, roles) = service();
        let fallback = roles.create(role("Viewer", &[], true)).await.unwrap();
        let editor = roles.create(role("Editor", &["posts.edit"], false)).await.unwrap();

        let user = CreateUser {
            username: "writer".into(),
            email: None,
            password: "password123".into(),
            role_id: Some(editor.id),
            is_admin: false,
        };
        let user = storage.insert_user(user.into_record().unwrap()).await.unwrap();

        assert!(matches!(
            roles.delete(fallback.id).await,
            Err(AppError::BadRequest(_))
        ));

        roles.delete(editor.id).await.unwrap();
        let user = storage.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.role_id, Some(fallback.id));
        assert!(matches!(roles.get(editor.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn assign_requires_existing_role_and_user() {
        let (storage, roles) = service();
        let editor = roles.create(role("Editor", &[], false)).await.unwrap();
        let user = CreateUser {
            username: "writer".into(),
            email: None,
            password: "password123".into(),
            role_id: None,
            is_admin: false,
        };
        let user = storage.insert_user(user.into_record().unwrap()).await.unwrap();

        assert!(matches!(roles.assign(user.id, Some(99)).await, Err(AppError::NotFound(_))));
        assert!(matches!(roles.assign(99, Some(editor.id)).await, Err(AppError::NotFound(_))));
        let updated = roles.assign(user.id, Some(editor.id)).await.unwrap();
        assert_eq!(updated.role_id, Some(editor.id));
    }
}
