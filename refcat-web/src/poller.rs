//! Collection change detection
//!
//! [`VersionTracker`] wraps the injected [`VersionStore`] and never fails:
//! store errors are logged and read as "version unknown". [`ChangeDetector`]
//! compares the upstream `Last-Modified-Version` token with the stored one
//! and records the new token when a collection changed.

use futures::future::join_all;
use refcat_common::versions::{VersionStore, UNKNOWN_VERSION};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::zotero::CatalogSource;

/// Version reported when the upstream token could not be obtained
pub const UNAVAILABLE_VERSION: &str = "unknown";

/// Outcome of comparing a stored token with the current one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub has_changed: bool,
    pub last_version: String,
    pub current_version: String,
}

/// Last-seen version bookkeeping over a [`VersionStore`]
#[derive(Clone)]
pub struct VersionTracker {
    store: Arc<dyn VersionStore>,
}

impl VersionTracker {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Stored token, or `"0"` when unknown or unreadable
    pub async fn last_known_version(&self, collection_key: &str) -> String {
        match self.store.get(collection_key).await {
            Ok(Some(version)) => version,
            Ok(None) => UNKNOWN_VERSION.to_string(),
            Err(e) => {
                warn!(collection = %collection_key, error = %e, "Failed to read stored version");
                UNKNOWN_VERSION.to_string()
            }
        }
    }

    /// Compare `current_version` with the stored token without writing
    pub async fn check_if_collection_changed(
        &self,
        collection_key: &str,
        current_version: &str,
    ) -> VersionCheck {
        let last_version = self.last_known_version(collection_key).await;
        VersionCheck {
            has_changed: last_version != current_version,
            last_version,
            current_version: current_version.to_string(),
        }
    }

    /// Record a token unconditionally; failures are logged only
    pub async fn set_collection_version(&self, collection_key: &str, version: &str) {
        match self.store.set(collection_key, version).await {
            Ok(()) => debug!(collection = %collection_key, version = %version, "Stored collection version"),
            Err(e) => warn!(collection = %collection_key, error = %e, "Failed to store collection version"),
        }
    }

    /// Record `new` only if the stored token is still `expected`
    ///
    /// Returns false when another writer got there first or the store failed.
    pub async fn advance_collection_version(
        &self,
        collection_key: &str,
        expected: &str,
        new: &str,
    ) -> bool {
        match self.store.compare_and_swap(collection_key, expected, new).await {
            Ok(true) => true,
            Ok(false) => {
                info!(
                    collection = %collection_key,
                    expected = %expected,
                    version = %new,
                    "Stored version moved concurrently, keeping the other writer's value"
                );
                false
            }
            Err(e) => {
                warn!(collection = %collection_key, error = %e, "Failed to store collection version");
                false
            }
        }
    }
}

/// Per-collection change detection result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub key: String,
    pub has_changed: bool,
    pub last_version: String,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeReport {
    fn unavailable(collection_key: &str, last_version: String, error: String) -> Self {
        Self {
            key: collection_key.to_string(),
            has_changed: true,
            last_version,
            current_version: UNAVAILABLE_VERSION.to_string(),
            error: Some(error),
        }
    }
}

/// Detects upstream changes per collection
#[derive(Clone)]
pub struct ChangeDetector {
    source: Arc<dyn CatalogSource>,
    tracker: VersionTracker,
}

impl ChangeDetector {
    pub fn new(source: Arc<dyn CatalogSource>, tracker: VersionTracker) -> Self {
        Self { source, tracker }
    }

    pub fn tracker(&self) -> &VersionTracker {
        &self.tracker
    }

    /// Check one collection, persisting the new token when it changed
    ///
    /// Fails open: an upstream error or a missing version header reports the
    /// collection as changed with current version `"unknown"` and stores
    /// nothing.
    pub async fn detect_changes(&self, collection_key: &str) -> ChangeReport {
        let current = match self.source.collection_version(collection_key).await {
            Ok(Some(version)) => version,
            Ok(None) => {
                warn!(collection = %collection_key, "Upstream response carried no version header");
                let last = self.tracker.last_known_version(collection_key).await;
                return ChangeReport::unavailable(
                    collection_key,
                    last,
                    "Missing Last-Modified-Version header".to_string(),
                );
            }
            Err(e) => {
                warn!(collection = %collection_key, error = %e, "Change detection failed, assuming changed");
                let last = self.tracker.last_known_version(collection_key).await;
                return ChangeReport::unavailable(collection_key, last, e.to_string());
            }
        };

        let check = self
            .tracker
            .check_if_collection_changed(collection_key, &current)
            .await;

        if check.has_changed {
            info!(
                collection = %collection_key,
                from = %check.last_version,
                to = %check.current_version,
                "Collection changed"
            );
            self.tracker
                .advance_collection_version(collection_key, &check.last_version, &current)
                .await;
        } else {
            debug!(collection = %collection_key, version = %current, "Collection unchanged");
        }

        ChangeReport {
            key: collection_key.to_string(),
            has_changed: check.has_changed,
            last_version: check.last_version,
            current_version: check.current_version,
            error: None,
        }
    }

    /// Check all collections concurrently; returns only the changed ones
    pub async fn poll_for_changes(&self, collection_keys: &[String]) -> Vec<ChangeReport> {
        let reports = join_all(collection_keys.iter().map(|key| self.detect_changes(key))).await;
        reports.into_iter().filter(|r| r.has_changed).collect()
    }
}
