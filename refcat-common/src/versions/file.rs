//! Flat JSON file version store

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{VersionStore, UNKNOWN_VERSION};
use crate::Result;

/// Version store backed by a single pretty-printed JSON object
///
/// ```json
/// {
///   "F9DNTXQA": "1235",
///   "ZD2RV8H9": "1198"
/// }
/// ```
///
/// The whole file is read on every call and rewritten on every write.
/// Calls within one process are serialized by a mutex; nothing protects
/// against another process writing the same file.
pub struct FileVersionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored map; an unparsable file reads as empty and is replaced on the
    /// next write
    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(versions) => Ok(versions),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Unreadable version file, starting empty");
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, versions: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(versions)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, token: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut versions = self.load().await?;
        versions.insert(key.to_string(), token.to_string());
        self.save(&versions).await?;
        debug!(key = %key, token = %token, "Stored collection version");
        Ok(())
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut versions = self.load().await?;
        let current = versions.get(key).map(String::as_str).unwrap_or(UNKNOWN_VERSION);
        if current != expected {
            return Ok(false);
        }
        versions.insert(key.to_string(), new.to_string());
        self.save(&versions).await?;
        Ok(true)
    }
}
