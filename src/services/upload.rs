//! Image uploads stored as plain files under the upload directory.
//!
//! - Only `image/*` content types are accepted, up to `max_bytes`.
//! - Stored names are generated (`image-<millis>-<uuid><.ext>`); the client name is only
//!   used for its extension.
//! - Files are served back by the static `/uploads` route.
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("select a file to upload")]
    MissingFile,
    #[error("only image files can be uploaded")]
    NotAnImage,
    #[error("file size cannot exceed {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
    #[error("malformed multipart request")]
    Malformed,
    #[error("invalid file name")]
    InvalidFilename,
    #[error("upload storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFile => "MISSING_FILE",
            Self::NotAnImage => "NOT_AN_IMAGE",
            Self::TooLarge { .. } => "FILE_TOO_LARGE",
            Self::Malformed => "MALFORMED_UPLOAD",
            Self::InvalidFilename => "INVALID_FILENAME",
            Self::Io(_) => "UPLOAD_IO",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub fn check(&self, content_type: Option<&str>, size: usize) -> Result<(), UploadError> {
        if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
            return Err(UploadError::NotAnImage);
        }
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    pub async fn save(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        self.check(content_type, bytes.len())?;

        let filename = stored_filename(original_name, Utc::now().timestamp_millis(), Uuid::new_v4());
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        info!(filename = %filename, size = bytes.len(), "file uploaded");

        Ok(StoredUpload {
            filename,
            original_name: original_name.to_string(),
            size: bytes.len(),
        })
    }

    /// Delete an uploaded file. Missing files are not an error; returns whether one was removed.
    pub async fn delete(&self, filename: &str) -> Result<bool, UploadError> {
        if !is_safe_filename(filename) {
            return Err(UploadError::InvalidFilename);
        }

        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => {
                info!(filename = %filename, "file deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn stored_filename(original_name: &str, millis: i64, id: Uuid) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("image-{}-{}{}", millis, id.simple(), ext)
}

/// A single path component made of safe characters; no traversal, no hidden files.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// `<base>/uploads/<filename>`, where base is the configured public URL or `http://<host>`.
pub fn public_url(public_base_url: Option<&str>, host: Option<&str>, filename: &str) -> String {
    match (public_base_url, host) {
        (Some(base), _) => format!("{}/uploads/{}", base, filename),
        (None, Some(host)) => format!("http://{}/uploads/{}", host, filename),
        (None, None) => format!("/uploads/{}", filename),
    }
}
