//! Users and roles.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::PgStorage;
use crate::models::{Role, User};
use crate::storage::{RoleStore, UserStore};

#[async_trait]
impl UserStore for PgStorage {
    async fn insert_user(&self, user: User) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role_id, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert user")
    }

    async fn update_user(&self, user: User) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, role_id = $4, is_admin = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(user.is_admin)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update user")
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user")
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch user by username")
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list users")
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleStore for PgStorage {
    async fn insert_role(&self, role: Role) -> Result<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, description, permissions, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .bind(role.is_default)
        .bind(role.created_at)
        .bind(role.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert role")
    }

    async fn update_role(&self, role: Role) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2, description = $3, permissions = $4, updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(&role.permissions)
        .bind(role.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update role")
    }

    async fn get_role(&self, id: i32) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch role")
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch role by name")
    }

    async fn get_default_role(&self) -> Result<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE is_default LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch default role")
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list roles")
    }

    async fn set_default_role(&self, id: i32) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        // The partial unique index allows only one default at a time, so the
        // old flag has to be cleared before the new one is set.
        sqlx::query("UPDATE roles SET is_default = FALSE WHERE is_default AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to clear default role")?;

        let result =
            sqlx::query("UPDATE roles SET is_default = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("failed to set default role")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.context("failed to roll back")?;
            return Ok(false);
        }

        tx.commit().await.context("failed to commit default role")?;
        Ok(true)
    }

    async fn delete_role(&self, id: i32, reassign_to: Option<i32>) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        sqlx::query("UPDATE users SET role_id = $2, updated_at = NOW() WHERE role_id = $1")
            .bind(id)
            .bind(reassign_to)
            .execute(&mut *tx)
            .await
            .context("failed to reassign users")?;

        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete role")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.context("failed to roll back")?;
            return Ok(false);
        }

        tx.commit().await.context("failed to commit role deletion")?;
        Ok(true)
    }
}
