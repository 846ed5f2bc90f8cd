//! Site settings singleton with a read-through cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::info;
use validator::Validate;

use crate::error::AppResult;
use crate::metrics::Metrics;
use crate::models::{SiteSettings, UpdateSiteSettings};
use crate::storage::Storage;

const CACHE_NAME: &str = "site_settings";

pub struct SiteSettingsService {
    storage: Arc<dyn Storage>,
    metrics: Arc<Metrics>,
    cache: Cache<(), SiteSettings>,
}

impl SiteSettingsService {
    pub fn new(storage: Arc<dyn Storage>, metrics: Arc<Metrics>) -> Self {
        Self {
            storage,
            metrics,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(600))
                .build(),
        }
    }

    /// Current settings, or the defaults when none were saved yet.
    pub async fn get(&self) -> AppResult<SiteSettings> {
        if let Some(settings) = self.cache.get(&()).await {
            self.metrics.record_cache_hit(CACHE_NAME);
            return Ok(settings);
        }
        self.metrics.record_cache_miss(CACHE_NAME);

        let settings = self.storage.get_site_settings().await?.unwrap_or_default();
        self.cache.insert((), settings.clone()).await;
        Ok(settings)
    }

    /// Merge a partial update into the current settings and save them,
    /// creating the row on first use.
    pub async fn update(&self, patch: UpdateSiteSettings) -> AppResult<SiteSettings> {
        patch.validate()?;

        let mut settings = self.storage.get_site_settings().await?.unwrap_or_default();
        patch.apply(&mut settings);
        let saved = self.storage.save_site_settings(settings).await?;

        self.cache.insert((), saved.clone()).await;
        info!(site_name = %saved.site_name, "site settings saved");
        Ok(saved)
    }
}
