use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Public URL prefix the upload directory is served under
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is empty")]
    Empty,

    #[error("File must be an image")]
    NotAnImage,

    #[error("Unsupported image format. Allowed: jpg, jpeg, png, gif, webp, bmp")]
    UnsupportedFormat,

    #[error("File is too large. Maximum size is {} MB", max / (1024 * 1024))]
    TooLarge { max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// True for errors caused by the uploaded content rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Public path, always under `/uploads/`
    pub path: String,
    pub file_name: String,
    pub size: usize,
    pub content_type: String,
}

/// Stores product images on local disk under generated names
#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_file_bytes: usize,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>, max_file_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes,
        }
    }

    /// Create the upload directory if it is missing
    pub async fn ensure_directory(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        debug!("Upload directory ready: {}", self.dir.display());
        Ok(())
    }

    /// Absolute form of the upload directory, for status reporting
    pub fn upload_directory(&self) -> PathBuf {
        if self.dir.is_absolute() {
            return self.dir.clone();
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&self.dir))
            .unwrap_or_else(|_| self.dir.clone())
    }

    /// Validate an uploaded image and write it under a fresh UUID name
    pub async fn store_image(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredImage, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        let content_type = match content_type {
            Some(ct) if ct.starts_with("image/") => ct,
            _ => return Err(UploadError::NotAnImage),
        };

        let extension = original_name
            .and_then(extension_of)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or(UploadError::UnsupportedFormat)?;

        if bytes.len() > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                max: self.max_file_bytes,
            });
        }

        self.ensure_directory().await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        info!(file = %file_name, size = bytes.len(), "Stored uploaded image");
        Ok(StoredImage {
            path: format!("{UPLOAD_URL_PREFIX}{file_name}"),
            file_name,
            size: bytes.len(),
            content_type: content_type.to_string(),
        })
    }

    /// Remove a previously stored image by its public path.
    ///
    /// Only the final segment of a `/uploads/` path is honoured, so a request
    /// can never reach outside the upload directory. Returns whether a file
    /// was actually removed.
    pub async fn delete_image(&self, path: &str) -> Result<bool, UploadError> {
        let Some(rest) = path.strip_prefix(UPLOAD_URL_PREFIX) else {
            return Ok(false);
        };

        let file_name = rest.rsplit('/').next().unwrap_or_default();
        if !is_plain_file_name(file_name) {
            warn!(path = %path, "Refusing to delete image outside upload directory");
            return Ok(false);
        }

        let target = self.dir.join(file_name);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                info!(file = %file_name, "Deleted uploaded image");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;

    const FIVE_MB: usize = 5 * 1024 * 1024;

    fn service() -> (UploadService, PathBuf) {
        let dir = scratch_dir("upload");
        (UploadService::new(&dir, FIVE_MB), dir)
    }

    #[tokio::test]
    async fn stores_image_under_generated_name() {
        let (service, dir) = service();
        let stored = service
            .store_image(Some("Foto.PNG"), Some("image/png"), b"\x89PNG fake")
            .await
            .unwrap();

        assert!(stored.path.starts_with("/uploads/"));
        assert!(stored.file_name.ends_with(".png"));
        assert_ne!(stored.file_name, "Foto.PNG");
        assert_eq!(stored.size, 9);
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(std::fs::read(dir.join(&stored.file_name)).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn rejects_empty_file() {
        let (service, _) = service();
        let err = service.store_image(Some("a.png"), Some("image/png"), b"").await.unwrap_err();
        assert!(matches!(err, UploadError::Empty));
    }

    #[tokio::test]
    async fn rejects_non_image_content_type() {
        let (service, _) = service();
        let err = service
            .store_image(Some("notes.png"), Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage));

        let err = service.store_image(Some("a.png"), None, b"hello").await.unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage));
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let (service, _) = service();
        let err = service
            .store_image(Some("vector.svg"), Some("image/svg+xml"), b"<svg/>")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat));

        let err = service
            .store_image(None, Some("image/png"), b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat));
    }

    #[tokio::test]
    async fn rejects_oversized_file() {
        let dir = scratch_dir("upload-small");
        let service = UploadService::new(&dir, 8);
        let err = service
            .store_image(Some("big.jpg"), Some("image/jpeg"), &[0u8; 9])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { max: 8 }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn deletes_stored_image_once() {
        let (service, _) = service();
        let stored = service
            .store_image(Some("a.jpg"), Some("image/jpeg"), b"jpeg")
            .await
            .unwrap();

        assert!(service.delete_image(&stored.path).await.unwrap());
        assert!(!service.delete_image(&stored.path).await.unwrap());
    }

    #[tokio::test]
    async fn refuses_paths_outside_upload_directory() {
        let (service, dir) = service();
        let outside = dir.parent().unwrap().join("keep.txt");
        std::fs::write(&outside, b"keep").unwrap();

        assert!(!service.delete_image("/etc/passwd").await.unwrap());
        assert!(!service.delete_image("/uploads/..").await.unwrap());
        assert!(!service.delete_image("/uploads/").await.unwrap());
        assert!(!service.delete_image("/uploads/..\\keep.txt").await.unwrap());
        assert!(outside.exists());
        let _ = std::fs::remove_file(outside);
    }

    #[tokio::test]
    async fn ensure_directory_creates_nested_path() {
        let dir = scratch_dir("upload-nested").join("a").join("b");
        let service = UploadService::new(&dir, FIVE_MB);
        service.ensure_directory().await.unwrap();
        assert!(dir.is_dir());
        assert!(service.upload_directory().is_absolute());
    }
}
