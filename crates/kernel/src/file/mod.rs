//! File and media management.
//!
//! Provides file upload, storage, and cleanup functionality.

pub mod service;
pub mod storage;

pub use service::{ALLOWED_MIME_TYPES, FileService, Upload};
pub use storage::{FileStorage, LocalFileStorage};
