//! PostgreSQL storage backend.
//!
//! Queries are hand-written SQL through `sqlx`; list endpoints with optional
//! equality filters are assembled with `sea-query`.

mod content;
mod menus;
mod site;
mod taxonomy;
mod users;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_query::{Alias, Asterisk, Expr, Order, PostgresQueryBuilder, Query, SelectStatement};
use sqlx::PgPool;

use super::Storage;
use crate::db;
use crate::models::EntityCounts;

/// Storage backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn healthy(&self) -> bool {
        db::check_health(&self.pool).await
    }

    async fn counts(&self) -> Result<EntityCounts> {
        sqlx::query_as::<_, EntityCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM scholarships) AS scholarships,
                (SELECT COUNT(*) FROM scholarships WHERE is_published) AS published_scholarships,
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COUNT(*) FROM pages) AS pages,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM levels) AS levels,
                (SELECT COUNT(*) FROM countries) AS countries,
                (SELECT COUNT(*) FROM tags) AS tags,
                (SELECT COUNT(*) FROM success_stories) AS success_stories,
                (SELECT COUNT(*) FROM subscribers) AS subscribers,
                (SELECT COUNT(*) FROM media) AS media,
                (SELECT COUNT(*) FROM users) AS users
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("failed to count entities")
    }
}

/// Newest-first listing over `table` with optional equality filters.
pub(super) struct ListQuery {
    query: SelectStatement,
}

impl ListQuery {
    pub(super) fn new(table: &str) -> Self {
        let mut query = Query::select();
        query.column(Asterisk).from(Alias::new(table));
        Self { query }
    }

    pub(super) fn eq_i32(mut self, column: &str, value: Option<i32>) -> Self {
        if let Some(value) = value {
            self.query.and_where(Expr::col(Alias::new(column)).eq(value));
        }
        self
    }

    pub(super) fn eq_bool(mut self, column: &str, value: Option<bool>) -> Self {
        if let Some(value) = value {
            self.query.and_where(Expr::col(Alias::new(column)).eq(value));
        }
        self
    }

    pub(super) fn build(mut self, limit: Option<u32>) -> String {
        self.query
            .order_by(Alias::new("created_at"), Order::Desc)
            .order_by(Alias::new("id"), Order::Desc);
        if let Some(limit) = limit {
            self.query.limit(u64::from(limit));
        }
        self.query.to_string(PostgresQueryBuilder)
    }
}
