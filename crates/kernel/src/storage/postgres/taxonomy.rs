//! Taxonomy terms. The four vocabularies share one schema, one table each.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::PgStorage;
use crate::models::{Term, TermKind};
use crate::storage::TermStore;

#[async_trait]
impl TermStore for PgStorage {
    async fn insert_term(&self, kind: TermKind, term: Term) -> Result<Term> {
        let sql = format!(
            r#"
            INSERT INTO {} (name, slug, description, icon, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
            kind.table()
        );
        sqlx::query_as::<_, Term>(&sql)
            .bind(&term.name)
            .bind(&term.slug)
            .bind(&term.description)
            .bind(&term.icon)
            .bind(term.sort_order)
            .bind(term.created_at)
            .bind(term.updated_at)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert {kind}"))
    }

    async fn update_term(&self, kind: TermKind, term: Term) -> Result<Option<Term>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET name = $2, slug = $3, description = $4, icon = $5, sort_order = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
            kind.table()
        );
        sqlx::query_as::<_, Term>(&sql)
            .bind(term.id)
            .bind(&term.name)
            .bind(&term.slug)
            .bind(&term.description)
            .bind(&term.icon)
            .bind(term.sort_order)
            .bind(term.updated_at)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to update {kind}"))
    }

    async fn get_term(&self, kind: TermKind, id: i32) -> Result<Option<Term>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", kind.table());
        sqlx::query_as::<_, Term>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {kind}"))
    }

    async fn get_term_by_slug(&self, kind: TermKind, slug: &str) -> Result<Option<Term>> {
        let sql = format!("SELECT * FROM {} WHERE slug = $1", kind.table());
        sqlx::query_as::<_, Term>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch {kind} by slug"))
    }

    async fn list_terms(&self, kind: TermKind) -> Result<Vec<Term>> {
        let sql = format!("SELECT * FROM {} ORDER BY sort_order, name", kind.table());
        sqlx::query_as::<_, Term>(&sql)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("failed to list {}", kind.table()))
    }

    async fn delete_term(&self, kind: TermKind, id: i32) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete {kind}"))?;
        Ok(result.rows_affected() > 0)
    }
}
