//! Blob store for uploaded story slides.
//!
//! Slides live in one namespace (directory) per nightline, named after the status they
//! belong to: `{root}/{nightline}/{status}.{ext}`. The core only talks to the
//! [`BlobStore`] trait; [`FsBlobStore`] is the filesystem implementation used in production.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Image extensions accepted for story slides (compared case-insensitively).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];

/// Returns the lowercased extension of `filename` if it is on the allow-list.
///
/// # Errors
/// Returns [`Error::Validation`] for a missing or disallowed extension.
pub fn validate_file_extension(filename: &str) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| Error::validation(format!("File '{filename}' has no extension")))?;

    if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        warn!("Invalid file extension for file: {}", filename);
        Err(Error::validation(format!(
            "Unsupported image type '{extension}', allowed: {}",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

/// Checks that the bytes look like the image type announced by `extension`.
///
/// # Errors
/// Returns [`Error::Validation`] when the content does not start with the PNG or JPEG signature.
pub fn validate_image_content(data: &[u8], extension: &str) -> Result<()> {
    let matches = match extension {
        "png" => data.starts_with(PNG_MAGIC),
        "jpg" | "jpeg" => data.starts_with(JPEG_MAGIC),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(Error::validation("Invalid image content"))
    }
}

/// Storage backend for slide images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Directory holding all slides of one nightline.
    fn namespace_path(&self, namespace: &str) -> PathBuf;

    /// Creates the namespace directory if it does not exist yet.
    async fn ensure_namespace(&self, namespace: &str) -> Result<PathBuf>;

    /// Returns the first existing `{base_path}.{ext}` over the allowed extensions.
    async fn exists_with_any_allowed_extension(&self, base_path: &Path) -> Result<Option<PathBuf>>;

    /// Writes `data` to `path`, replacing any file there.
    async fn write(&self, data: &[u8], path: &Path) -> Result<()>;

    /// Moves a file, replacing the destination.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Removes the file at `path`; a missing file is an error.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Reads the whole file at `path`.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`BlobStore`] backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`; the directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn storage_error(action: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::Storage {
        message: format!("Failed to {action} '{}': {e}", path.display()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    async fn ensure_namespace(&self, namespace: &str) -> Result<PathBuf> {
        let path = self.namespace_path(namespace);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            error!("Error creating storage directory '{}': {}", path.display(), e);
            storage_error("create directory", &path, &e)
        })?;
        info!("Storage directory created at: {}", path.display());
        Ok(path)
    }

    async fn exists_with_any_allowed_extension(&self, base_path: &Path) -> Result<Option<PathBuf>> {
        for ext in ALLOWED_IMAGE_EXTENSIONS {
            let candidate = base_path.with_extension(ext);
            let exists = tokio::fs::try_exists(&candidate)
                .await
                .map_err(|e| storage_error("inspect", &candidate, &e))?;
            if exists {
                debug!("Found an already existing file: '{}'", candidate.display());
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    async fn write(&self, data: &[u8], path: &Path) -> Result<()> {
        tokio::fs::write(path, data).await.map_err(|e| {
            error!("Error saving file '{}': {}", path.display(), e);
            storage_error("write", path, &e)
        })?;
        debug!("File saved successfully: {}", path.display());
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| storage_error("move file to", to, &e))
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            warn!("File '{}' does not exist", path.display());
            return Err(Error::Storage {
                message: format!("File '{}' does not exist", path.display()),
            });
        }
        tokio::fs::remove_file(path).await.map_err(|e| {
            error!("Error removing file '{}': {}", path.display(), e);
            storage_error("remove", path, &e)
        })?;
        info!("File '{}' removed successfully", path.display());
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| storage_error("read", path, &e))
    }
}
