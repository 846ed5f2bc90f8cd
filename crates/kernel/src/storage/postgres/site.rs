//! Subscribers, SEO settings, site settings and media.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::PgStorage;
use crate::models::{Media, SeoSetting, SiteSettings, Subscriber};
use crate::storage::{MediaStore, SeoStore, SiteSettingsStore, SubscriberStore};

#[async_trait]
impl SubscriberStore for PgStorage {
    async fn insert_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber> {
        sqlx::query_as::<_, Subscriber>(
            r#"
            INSERT INTO subscribers (email, name, is_active, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&subscriber.email)
        .bind(&subscriber.name)
        .bind(subscriber.is_active)
        .bind(subscriber.created_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert subscriber")
    }

    async fn update_subscriber(&self, subscriber: Subscriber) -> Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>(
            "UPDATE subscribers SET name = $2, is_active = $3 WHERE id = $1 RETURNING *",
        )
        .bind(subscriber.id)
        .bind(&subscriber.name)
        .bind(subscriber.is_active)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update subscriber")
    }

    async fn get_subscriber(&self, id: i32) -> Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch subscriber")
    }

    async fn get_subscriber_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch subscriber by email")
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list subscribers")
    }

    async fn delete_subscriber(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete subscriber")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SeoStore for PgStorage {
    async fn insert_seo(&self, seo: SeoSetting) -> Result<SeoSetting> {
        sqlx::query_as::<_, SeoSetting>(
            r#"
            INSERT INTO seo_settings
                (page_path, meta_title, meta_description, meta_keywords, og_image,
                 canonical_url, no_index, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&seo.page_path)
        .bind(&seo.meta_title)
        .bind(&seo.meta_description)
        .bind(&seo.meta_keywords)
        .bind(&seo.og_image)
        .bind(&seo.canonical_url)
        .bind(seo.no_index)
        .bind(seo.created_at)
        .bind(seo.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert SEO setting")
    }

    async fn update_seo(&self, seo: SeoSetting) -> Result<Option<SeoSetting>> {
        sqlx::query_as::<_, SeoSetting>(
            r#"
            UPDATE seo_settings
            SET page_path = $2, meta_title = $3, meta_description = $4, meta_keywords = $5,
                og_image = $6, canonical_url = $7, no_index = $8, updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(seo.id)
        .bind(&seo.page_path)
        .bind(&seo.meta_title)
        .bind(&seo.meta_description)
        .bind(&seo.meta_keywords)
        .bind(&seo.og_image)
        .bind(&seo.canonical_url)
        .bind(seo.no_index)
        .bind(seo.updated_at)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update SEO setting")
    }

    async fn get_seo(&self, id: i32) -> Result<Option<SeoSetting>> {
        sqlx::query_as::<_, SeoSetting>("SELECT * FROM seo_settings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch SEO setting")
    }

    async fn get_seo_by_path(&self, path: &str) -> Result<Option<SeoSetting>> {
        sqlx::query_as::<_, SeoSetting>("SELECT * FROM seo_settings WHERE page_path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch SEO setting by path")
    }

    async fn list_seo(&self) -> Result<Vec<SeoSetting>> {
        sqlx::query_as::<_, SeoSetting>("SELECT * FROM seo_settings ORDER BY page_path")
            .fetch_all(&self.pool)
            .await
            .context("failed to list SEO settings")
    }

    async fn delete_seo(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM seo_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete SEO setting")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SiteSettingsStore for PgStorage {
    async fn get_site_settings(&self) -> Result<Option<SiteSettings>> {
        sqlx::query_as::<_, SiteSettings>("SELECT * FROM site_settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch site settings")
    }

    async fn save_site_settings(&self, s: SiteSettings) -> Result<SiteSettings> {
        sqlx::query_as::<_, SiteSettings>(
            r#"
            INSERT INTO site_settings
                (id, site_name, site_tagline, logo_url, favicon_url, primary_color,
                 secondary_color, accent_color, contact_email, footer_text,
                 show_featured_scholarships, show_latest_posts, show_success_stories,
                 show_newsletter, show_categories, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                site_name = EXCLUDED.site_name,
                site_tagline = EXCLUDED.site_tagline,
                logo_url = EXCLUDED.logo_url,
                favicon_url = EXCLUDED.favicon_url,
                primary_color = EXCLUDED.primary_color,
                secondary_color = EXCLUDED.secondary_color,
                accent_color = EXCLUDED.accent_color,
                contact_email = EXCLUDED.contact_email,
                footer_text = EXCLUDED.footer_text,
                show_featured_scholarships = EXCLUDED.show_featured_scholarships,
                show_latest_posts = EXCLUDED.show_latest_posts,
                show_success_stories = EXCLUDED.show_success_stories,
                show_newsletter = EXCLUDED.show_newsletter,
                show_categories = EXCLUDED.show_categories,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(&s.site_name)
        .bind(&s.site_tagline)
        .bind(&s.logo_url)
        .bind(&s.favicon_url)
        .bind(&s.primary_color)
        .bind(&s.secondary_color)
        .bind(&s.accent_color)
        .bind(&s.contact_email)
        .bind(&s.footer_text)
        .bind(s.show_featured_scholarships)
        .bind(s.show_latest_posts)
        .bind(s.show_success_stories)
        .bind(s.show_newsletter)
        .bind(s.show_categories)
        .bind(s.updated_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to save site settings")
    }
}

#[async_trait]
impl MediaStore for PgStorage {
    async fn insert_media(&self, media: Media) -> Result<Media> {
        sqlx::query_as::<_, Media>(
            r#"
            INSERT INTO media (filename, original_name, mime_type, size, url, alt_text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&media.filename)
        .bind(&media.original_name)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.url)
        .bind(&media.alt_text)
        .bind(media.created_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert media")
    }

    async fn update_media(&self, media: Media) -> Result<Option<Media>> {
        sqlx::query_as::<_, Media>("UPDATE media SET alt_text = $2 WHERE id = $1 RETURNING *")
            .bind(media.id)
            .bind(&media.alt_text)
            .fetch_optional(&self.pool)
            .await
            .context("failed to update media")
    }

    async fn get_media(&self, id: i32) -> Result<Option<Media>> {
        sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch media")
    }

    async fn list_media(&self) -> Result<Vec<Media>> {
        sqlx::query_as::<_, Media>("SELECT * FROM media ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list media")
    }

    async fn delete_media(&self, id: i32) -> Result<Option<Media>> {
        sqlx::query_as::<_, Media>("DELETE FROM media WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to delete media")
    }
}
