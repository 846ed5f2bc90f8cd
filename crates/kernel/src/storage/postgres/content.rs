//! Pages, scholarships, posts and success stories.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ListQuery, PgStorage};
use crate::models::{Page, Post, PostFilter, Scholarship, ScholarshipFilter, SuccessStory};
use crate::storage::{ListFilter, PageStore, PostStore, ScholarshipStore, SuccessStoryStore};

#[async_trait]
impl PageStore for PgStorage {
    async fn insert_page(&self, page: Page) -> Result<Page> {
        sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages
                (title, slug, content, meta_title, meta_description, meta_keywords,
                 is_published, show_in_header, show_in_footer, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(&page.meta_keywords)
        .bind(page.is_published)
        .bind(page.show_in_header)
        .bind(page.show_in_footer)
        .bind(page.created_at)
        .bind(page.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert page")
    }

    async fn update_page(&self, page: Page) -> Result<Option<Page>> {
        sqlx::query_as::<_, Page>(
            r#"
            UPDATE pages
            SET title = $2, slug = $3, content = $4, meta_title = $5, meta_description = $6,
                meta_keywords = $7, is_published = $8, show_in_header = $9,
                show_in_footer = $10, updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(page.id)
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(&page.meta_keywords)
        .bind(page.is_published)
        .bind(page.show_in_header)
        .bind(page.show_in_footer)
        .bind(page.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update page")
    }

    async fn get_page(&self, id: i32) -> Result<Option<Page>> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch page")
    }

    async fn get_page_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch page by slug")
    }

    async fn list_pages(&self, filter: ListFilter) -> Result<Vec<Page>> {
        let sql = ListQuery::new("pages")
            .eq_bool("is_published", filter.is_published)
            .build(filter.limit);
        sqlx::query_as::<_, Page>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list pages")
    }

    async fn delete_page(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete page")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ScholarshipStore for PgStorage {
    async fn insert_scholarship(&self, s: Scholarship) -> Result<Scholarship> {
        sqlx::query_as::<_, Scholarship>(
            r#"
            INSERT INTO scholarships
                (title, slug, description, content, amount, deadline, application_url,
                 image_url, category_id, level_id, country_id, is_published, is_featured,
                 meta_title, meta_description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(&s.title)
        .bind(&s.slug)
        .bind(&s.description)
        .bind(&s.content)
        .bind(&s.amount)
        .bind(s.deadline)
        .bind(&s.application_url)
        .bind(&s.image_url)
        .bind(s.category_id)
        .bind(s.level_id)
        .bind(s.country_id)
        .bind(s.is_published)
        .bind(s.is_featured)
        .bind(&s.meta_title)
        .bind(&s.meta_description)
        .bind(s.created_at)
        .bind(s.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert scholarship")
    }

    async fn update_scholarship(&self, s: Scholarship) -> Result<Option<Scholarship>> {
        sqlx::query_as::<_, Scholarship>(
            r#"
            UPDATE scholarships
            SET title = $2, slug = $3, description = $4, content = $5, amount = $6,
                deadline = $7, application_url = $8, image_url = $9, category_id = $10,
                level_id = $11, country_id = $12, is_published = $13, is_featured = $14,
                meta_title = $15, meta_description = $16, updated_at = $17
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(s.id)
        .bind(&s.title)
        .bind(&s.slug)
        .bind(&s.description)
        .bind(&s.content)
        .bind(&s.amount)
        .bind(s.deadline)
        .bind(&s.application_url)
        .bind(&s.image_url)
        .bind(s.category_id)
        .bind(s.level_id)
        .bind(s.country_id)
        .bind(s.is_published)
        .bind(s.is_featured)
        .bind(&s.meta_title)
        .bind(&s.meta_description)
        .bind(s.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update scholarship")
    }

    async fn get_scholarship(&self, id: i32) -> Result<Option<Scholarship>> {
        sqlx::query_as::<_, Scholarship>("SELECT * FROM scholarships WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch scholarship")
    }

    async fn get_scholarship_by_slug(&self, slug: &str) -> Result<Option<Scholarship>> {
        sqlx::query_as::<_, Scholarship>("SELECT * FROM scholarships WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch scholarship by slug")
    }

    async fn list_scholarships(&self, filter: &ScholarshipFilter) -> Result<Vec<Scholarship>> {
        let sql = ListQuery::new("scholarships")
            .eq_i32("category_id", filter.category_id)
            .eq_i32("level_id", filter.level_id)
            .eq_i32("country_id", filter.country_id)
            .eq_bool("is_published", filter.is_published)
            .eq_bool("is_featured", filter.is_featured)
            .build(filter.limit);
        sqlx::query_as::<_, Scholarship>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list scholarships")
    }

    async fn delete_scholarship(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scholarships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete scholarship")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PostStore for PgStorage {
    async fn insert_post(&self, p: Post) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts
                (title, slug, excerpt, content, image_url, category_id, author,
                 is_published, is_featured, meta_title, meta_description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&p.title)
        .bind(&p.slug)
        .bind(&p.excerpt)
        .bind(&p.content)
        .bind(&p.image_url)
        .bind(p.category_id)
        .bind(&p.author)
        .bind(p.is_published)
        .bind(p.is_featured)
        .bind(&p.meta_title)
        .bind(&p.meta_description)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert post")
    }

    async fn update_post(&self, p: Post) -> Result<Option<Post>> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, excerpt = $4, content = $5, image_url = $6,
                category_id = $7, author = $8, is_published = $9, is_featured = $10,
                meta_title = $11, meta_description = $12, updated_at = $13
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.title)
        .bind(&p.slug)
        .bind(&p.excerpt)
        .bind(&p.content)
        .bind(&p.image_url)
        .bind(p.category_id)
        .bind(&p.author)
        .bind(p.is_published)
        .bind(p.is_featured)
        .bind(&p.meta_title)
        .bind(&p.meta_description)
        .bind(p.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update post")
    }

    async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch post")
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch post by slug")
    }

    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let sql = ListQuery::new("posts")
            .eq_i32("category_id", filter.category_id)
            .eq_bool("is_published", filter.is_published)
            .eq_bool("is_featured", filter.is_featured)
            .build(filter.limit);
        sqlx::query_as::<_, Post>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list posts")
    }

    async fn delete_post(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SuccessStoryStore for PgStorage {
    async fn insert_story(&self, story: SuccessStory) -> Result<SuccessStory> {
        sqlx::query_as::<_, SuccessStory>(
            r#"
            INSERT INTO success_stories
                (name, title, content, image_url, scholarship_id, country, is_published,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&story.name)
        .bind(&story.title)
        .bind(&story.content)
        .bind(&story.image_url)
        .bind(story.scholarship_id)
        .bind(&story.country)
        .bind(story.is_published)
        .bind(story.created_at)
        .bind(story.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert success story")
    }

    async fn update_story(&self, story: SuccessStory) -> Result<Option<SuccessStory>> {
        sqlx::query_as::<_, SuccessStory>(
            r#"
            UPDATE success_stories
            SET name = $2, title = $3, content = $4, image_url = $5, scholarship_id = $6,
                country = $7, is_published = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(story.id)
        .bind(&story.name)
        .bind(&story.title)
        .bind(&story.content)
        .bind(&story.image_url)
        .bind(story.scholarship_id)
        .bind(&story.country)
        .bind(story.is_published)
        .bind(story.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update success story")
    }

    async fn get_story(&self, id: i32) -> Result<Option<SuccessStory>> {
        sqlx::query_as::<_, SuccessStory>("SELECT * FROM success_stories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch success story")
    }

    async fn list_stories(&self, filter: ListFilter) -> Result<Vec<SuccessStory>> {
        let sql = ListQuery::new("success_stories")
            .eq_bool("is_published", filter.is_published)
            .build(filter.limit);
        sqlx::query_as::<_, SuccessStory>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to list success stories")
    }

    async fn delete_story(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM success_stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete success story")?;
        Ok(result.rows_affected() > 0)
    }
}
