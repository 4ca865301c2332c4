//! Scratch storage for conversion artifacts.
//!
//! Each terminal action gets its own directory under the scratch root,
//! named `<user>-<uuid>`, so two users producing `contacts.vcf` at the same
//! moment never touch the same path. The directory is removed when the
//! [`ScratchArea`] guard is dropped, whether the action succeeded or not.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

/// Root directory holding per-request scratch areas.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing.
    pub async fn ensure(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Create a fresh, empty area owned by `owner`.
    pub async fn acquire(&self, owner: i64) -> std::io::Result<ScratchArea> {
        let path = self.root.join(format!("{owner}-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).await?;
        tracing::debug!(path = %path.display(), "Scratch area acquired");
        Ok(ScratchArea { path })
    }
}

/// A per-request directory, deleted on drop.
#[derive(Debug)]
pub struct ScratchArea {
    path: PathBuf,
}

impl ScratchArea {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `content` as `file_name` inside this area and return its path.
    ///
    /// `file_name` must be a bare name; anything with a path component is
    /// refused.
    pub async fn write(&self, file_name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        let bare = Path::new(file_name)
            .file_name()
            .filter(|name| name.to_str() == Some(file_name))
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid artifact file name: {file_name:?}"),
                )
            })?;
        let full_path = self.path.join(bare);
        fs::write(&full_path, content).await?;
        Ok(full_path)
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        // Inline blocking removal: an area holds only one job's small files
        // and must be gone before the next event is handled.
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Scratch area removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove scratch area"
            ),
        }
    }
}
