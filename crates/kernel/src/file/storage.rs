//! File storage backends.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// File storage backend trait. Files are addressed by a flat storage name.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write data under the given name.
    async fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Read a stored file.
    async fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Delete a file. Missing files are not an error.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn exists(&self, name: &str) -> Result<bool>;

    /// Public URL the file is served from.
    fn public_url(&self, name: &str) -> String;
}

/// Local filesystem storage.
pub struct LocalFileStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a storage name to a path inside the base directory.
    ///
    /// Rejects names with directory components to prevent traversal.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.base_path.join(name)),
            _ => bail!("invalid storage name: {name}"),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;

        fs::create_dir_all(&self.base_path)
            .await
            .context("failed to create upload directory")?;

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create file")?;
        file.write_all(data).await.context("failed to write file")?;
        file.flush().await.context("failed to flush file")?;

        debug!(name = %name, path = ?path, size = data.len(), "file written");
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        fs::read(&path).await.context("failed to read file")
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path)
                .await
                .context("failed to delete file")?;
            debug!(name = %name, "file deleted");
        } else {
            warn!(name = %name, "file not found for deletion");
        }

        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}

impl std::fmt::Debug for LocalFileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFileStorage")
            .field("base_path", &self.base_path)
            .field("base_url", &self.base_url)
            .finish()
    }
}
