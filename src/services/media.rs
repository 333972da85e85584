//! Local media storage for uploaded avatars.
//!
//! Files live under the configured media directory and are served read-only
//! at `/media`. Keys are relative paths such as `avatars/<uuid>.png`.

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Subdirectory holding avatar images.
const AVATAR_DIR: &str = "avatars";

/// Media storage rooted at one directory.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root and avatar directories if missing.
    pub async fn ensure_dirs(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.root.join(AVATAR_DIR)).await?;
        info!("Media storage ready at {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store avatar bytes under a fresh random name and return its key.
    pub async fn save_avatar(&self, extension: &str, data: &[u8]) -> AppResult<String> {
        let key = format!("{}/{}.{}", AVATAR_DIR, Uuid::new_v4(), extension);
        self.put(&key, data).await?;
        Ok(key)
    }

    /// Write a file. Parent directories are created as needed.
    pub async fn put(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))
    }

    /// Delete a file, logging instead of failing when it cannot be removed.
    pub async fn delete_quietly(&self, key: &str) {
        let path = match self.resolve(key) {
            Ok(path) => path,
            Err(e) => {
                warn!("Refusing to delete media key {}: {}", key, e);
                return;
            }
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete media file {}: {}", path.display(), e),
        }
    }

    /// Map a key to a path inside the root, rejecting traversal.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::InvalidInput(format!("Invalid media key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}
