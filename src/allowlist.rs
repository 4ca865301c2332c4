//! Allow-list of user ids, persisted as `{ "users": [ids...] }`.
//!
//! The file is read wholesale at startup and rewritten wholesale on every
//! change. A missing or blank file is an empty list.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::StoreError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct AllowListFile {
    #[serde(default)]
    users: Vec<i64>,
}

/// The set of user ids allowed to use the bot.
#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,
    users: BTreeSet<i64>,
}

impl AllowList {
    /// Load the list from `path`. A missing file yields an empty list.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No allow-list file yet, starting empty");
                String::new()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let file: AllowListFile = if raw.trim().is_empty() {
            AllowListFile::default()
        } else {
            serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: path.display().to_string(),
                source,
            })?
        };

        Ok(Self {
            path,
            users: file.users.into_iter().collect(),
        })
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users in ascending id order.
    pub fn users(&self) -> Vec<i64> {
        self.users.iter().copied().collect()
    }

    /// Add a user and persist. Returns `false` if already present.
    ///
    /// The in-memory set only changes once the file is written.
    pub async fn insert(&mut self, user_id: i64) -> Result<bool, StoreError> {
        if self.users.contains(&user_id) {
            return Ok(false);
        }
        let mut next = self.users.clone();
        next.insert(user_id);
        self.write(&next).await?;
        self.users = next;
        Ok(true)
    }

    /// Remove a user and persist. Returns `false` if not present.
    ///
    /// The in-memory set only changes once the file is written.
    pub async fn remove(&mut self, user_id: i64) -> Result<bool, StoreError> {
        if !self.users.contains(&user_id) {
            return Ok(false);
        }
        let mut next = self.users.clone();
        next.remove(&user_id);
        self.write(&next).await?;
        self.users = next;
        Ok(true)
    }

    /// Rewrite the whole file.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.write(&self.users).await
    }

    async fn write(&self, users: &BTreeSet<i64>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };
        let body = serde_json::to_string_pretty(&AllowListFile {
            users: users.iter().copied().collect(),
        })
        .map_err(|source| StoreError::Json {
            path: self.path.display().to_string(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        fs::write(&self.path, body).await.map_err(io_err)?;
        tracing::info!(path = %self.path.display(), users = users.len(), "Allow-list saved");
        Ok(())
    }
}
