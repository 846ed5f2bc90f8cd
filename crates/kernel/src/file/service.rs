//! Media upload service.
//!
//! Validates uploads, stores the bytes under a generated name and keeps the
//! media records in step with the files on disk.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::storage::FileStorage;
use crate::error::{AppError, AppResult};
use crate::models::Media;
use crate::storage::Storage;

/// Allowed MIME types for upload, with the extension stored files get.
pub const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    // Images
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/avif", "avif"),
    ("image/x-icon", "ico"),
    ("image/vnd.microsoft.icon", "ico"),
    // Documents
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    ("application/vnd.ms-excel", "xls"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
];

/// One file received from a multipart form.
#[derive(Debug)]
pub struct Upload<'a> {
    pub original_name: &'a str,
    /// Content type the client declared, if any.
    pub declared_mime: Option<&'a str>,
    pub data: &'a [u8],
    pub alt_text: Option<String>,
}

/// Media service for managing uploads.
pub struct FileService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStorage>,
    max_size: usize,
}

impl FileService {
    pub fn new(storage: Arc<dyn Storage>, files: Arc<dyn FileStorage>, max_size: usize) -> Self {
        Self {
            storage,
            files,
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Validate and store an upload, then record it.
    pub async fn upload(&self, upload: Upload<'_>) -> AppResult<Media> {
        if upload.data.is_empty() {
            return Err(AppError::BadRequest("file is empty".to_string()));
        }
        if upload.data.len() > self.max_size {
            return Err(AppError::BadRequest(format!(
                "file too large: {} bytes (max {} bytes)",
                upload.data.len(),
                self.max_size
            )));
        }

        let mime_type = detect_mime(upload.data, upload.declared_mime);
        let Some(extension) = extension_for(&mime_type) else {
            return Err(AppError::BadRequest(format!(
                "file type not allowed: {mime_type}"
            )));
        };

        // The client filename never picks the stored extension.
        let filename = format!("{}.{}", Uuid::now_v7().simple(), extension);

        self.files.write(&filename, upload.data).await?;

        let record = Media {
            id: 0,
            filename: filename.clone(),
            original_name: sanitize_filename(upload.original_name),
            mime_type,
            size: upload.data.len() as i64,
            url: self.files.public_url(&filename),
            alt_text: upload.alt_text,
            created_at: Utc::now(),
        };

        match self.storage.insert_media(record).await {
            Ok(media) => {
                info!(media_id = media.id, filename = %media.filename, size = media.size, "file uploaded");
                Ok(media)
            }
            Err(e) => {
                // keep disk and records in step
                if let Err(cleanup) = self.files.delete(&filename).await {
                    warn!(error = %cleanup, filename = %filename, "failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }

    /// Delete a media record and its file.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let media = self
            .storage
            .delete_media(id)
            .await?
            .ok_or_else(|| AppError::not_found("media"))?;

        if let Err(e) = self.files.delete(&media.filename).await {
            warn!(error = %e, filename = %media.filename, "failed to delete media file");
        }

        info!(media_id = id, filename = %media.filename, "media deleted");
        Ok(())
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("max_size", &self.max_size)
            .finish()
    }
}

/// Sniff the MIME type from content, falling back to the declared type.
pub fn detect_mime(data: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    declared
        .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Stored extension for an accepted MIME type; `None` when not allowed.
pub fn extension_for(mime_type: &str) -> Option<&'static str> {
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime_type)
        .map(|(_, extension)| *extension)
}

/// Sanitize a client-supplied filename for display.
fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(200)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::file::LocalFileStorage;
    use crate::storage::{MediaStore, MemStorage};

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn sniffed_type_wins_over_declared() {
        assert_eq!(detect_mime(PNG, Some("text/plain")), "image/png");
        assert_eq!(detect_mime(b"a,b\n1,2\n", Some("text/csv; charset=utf-8")), "text/csv");
        assert_eq!(detect_mime(b"???", None), "application/octet-stream");
    }

    #[test]
    fn sanitize_strips_paths() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).png"), "my_photo__1_.png");
    }

    #[test]
    fn extension_follows_the_accepted_type() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("text/plain"), Some("txt"));
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(extension_for("application/octet-stream"), None);
    }

    #[tokio::test]
    async fn client_filename_does_not_pick_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileService::new(
            Arc::new(MemStorage::new()),
            Arc::new(LocalFileStorage::new(dir.path(), "/uploads")),
            1024,
        );

        let media = service
            .upload(Upload {
                original_name: "x.html",
                declared_mime: Some("text/plain"),
                data: b"hi <script>alert(1)</script>",
                alt_text: None,
            })
            .await
            .unwrap();

        assert_eq!(media.mime_type, "text/plain");
        assert!(media.filename.ends_with(".txt"), "{}", media.filename);
        assert_eq!(media.original_name, "x.html");

        let photo = service
            .upload(Upload {
                original_name: "photo.jpg",
                declared_mime: Some("image/jpeg"),
                data: PNG,
                alt_text: None,
            })
            .await
            .unwrap();
        assert!(photo.filename.ends_with(".png"));
    }

    #[tokio::test]
    async fn upload_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(MemStorage::new());
        let files = Arc::new(LocalFileStorage::new(dir.path(), "/uploads"));
        let service = FileService::new(storage.clone(), files.clone(), 1024);

        let media = service
            .upload(Upload {
                original_name: "logo.png",
                declared_mime: Some("image/png"),
                data: PNG,
                alt_text: Some("Logo".into()),
            })
            .await
            .unwrap();

        assert_eq!(media.mime_type, "image/png");
        assert!(media.filename.ends_with(".png"));
        assert_eq!(media.url, format!("/uploads/{}", media.filename));
        assert!(files.exists(&media.filename).await.unwrap());

        service.delete(media.id).await.unwrap();
        assert!(!files.exists(&media.filename).await.unwrap());
        assert!(storage.get_media(media.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete(media.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_and_disallowed_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileService::new(
            Arc::new(MemStorage::new()),
            Arc::new(LocalFileStorage::new(dir.path(), "/uploads")),
            8,
        );

        let too_big = service
            .upload(Upload {
                original_name: "big.txt",
                declared_mime: Some("text/plain"),
                data: b"0123456789",
                alt_text: None,
            })
            .await;
        assert!(matches!(too_big, Err(AppError::BadRequest(_))));

        let html = service
            .upload(Upload {
                original_name: "x.html",
                declared_mime: Some("text/html"),
                data: b"<p>",
                alt_text: None,
            })
            .await;
        assert!(matches!(html, Err(AppError::BadRequest(_))));
    }
}
