//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::file::{FileService, LocalFileStorage};
use crate::lockout::LockoutService;
use crate::metrics::Metrics;
use crate::models::{CreateUser, User};
use crate::permissions::PermissionService;
use crate::services::{MenuService, RoleService, SiteSettingsService};
use crate::storage::{MemStorage, PgStorage, Storage};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,

    /// Persistence backend selected at startup.
    storage: Arc<dyn Storage>,

    /// Permission service for access control.
    permissions: PermissionService,

    roles: RoleService,

    /// Menu CRUD and the cached structure resolver.
    menus: MenuService,

    settings: SiteSettingsService,

    /// File service for uploads.
    files: FileService,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,

    /// Account lockout service.
    lockout: LockoutService,
}

impl AppState {
    /// Create the application state, connecting to PostgreSQL when a
    /// database URL is configured.
    pub async fn new(config: &Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;
                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                Arc::new(PgStorage::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; content is kept in memory and lost on restart");
                Arc::new(MemStorage::new())
            }
        };
        info!(backend = storage.backend(), "storage ready");

        let state = Self::with_storage(config.clone(), storage);

        if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password)
        {
            if state.storage().list_users().await?.is_empty() {
                create_admin(state.storage().as_ref(), username, password, None).await?;
            }
        }

        Ok(state)
    }

    /// Build the state around an existing storage backend.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let metrics = Arc::new(Metrics::new());
        let permissions = PermissionService::new(storage.clone());
        let roles = RoleService::new(storage.clone(), permissions.clone());
        let menus = MenuService::new(storage.clone(), metrics.clone());
        let settings = SiteSettingsService::new(storage.clone(), metrics.clone());
        let files = FileService::new(
            storage.clone(),
            Arc::new(LocalFileStorage::new(&config.uploads_dir, &config.uploads_url)),
            config.max_upload_bytes,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                permissions,
                roles,
                menus,
                settings,
                files,
                metrics,
                lockout: LockoutService::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    pub fn permissions(&self) -> &PermissionService {
        &self.inner.permissions
    }

    pub fn roles(&self) -> &RoleService {
        &self.inner.roles
    }

    pub fn menus(&self) -> &MenuService {
        &self.inner.menus
    }

    pub fn settings(&self) -> &SiteSettingsService {
        &self.inner.settings
    }

    pub fn files(&self) -> &FileService {
        &self.inner.files
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn lockout(&self) -> &LockoutService {
        &self.inner.lockout
    }
}

/// Create a superuser account. Fails if the username is taken.
pub async fn create_admin(
    storage: &dyn Storage,
    username: &str,
    password: &str,
    email: Option<String>,
) -> Result<User> {
    if storage.get_user_by_username(username).await?.is_some() {
        anyhow::bail!("user '{username}' already exists");
    }

    let user = CreateUser {
        username: username.to_string(),
        email,
        password: password.to_string(),
        role_id: None,
        is_admin: true,
    }
    .into_record()?;

    let user = storage.insert_user(user).await?;
    info!(user_id = user.id, username = %user.username, "admin account created");
    Ok(user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_admin_refuses_duplicates() {
        let storage = MemStorage::new();
        let admin = create_admin(&storage, "root", "password123", None).await.unwrap();
        assert!(admin.is_admin);
        assert!(admin.verify_password("password123"));
        assert!(create_admin(&storage, "root", "other-pass", None).await.is_err());
    }

    #[tokio::test]
    async fn memory_backend_without_database_url() {
        let config = Config {
            admin_username: Some("admin".into()),
            admin_password: Some("password123".into()),
            ..Config::default()
        };
        let state = AppState::new(&config).await.unwrap();
        assert_eq!(state.storage().backend(), "memory");
        let users = state.storage().list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin);
    }
}
