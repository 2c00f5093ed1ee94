//! Tagged, time-bounded in-process cache for transformed resources
//!
//! Entries carry a set of tags and expire after the configured TTL.
//! [`ResourceCache::invalidate_tag`] drops every entry carrying a tag, which
//! is how the poll and revalidate endpoints force a fresh upstream fetch.
//!
//! Every invalidation bumps a generation counter. Writers read the
//! generation before going upstream and pass it back on store; a store
//! whose generation is stale is dropped, so a fetch that started before an
//! invalidation can't repopulate the cache with pre-invalidation data.

use refcat_common::model::Resource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Tag attached to every cached catalog entry
pub const RESOURCES_TAG: &str = "catalog-resources";

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    tags: Vec<&'static str>,
    stored_at: Instant,
}

/// Keyed entries of one kind
#[derive(Debug)]
struct TaggedMap<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TaggedMap<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < ttl)
            .map(|entry| entry.value.clone())
    }

    /// Insert unless `generation` moved away from `expected`
    ///
    /// The generation is compared under the write lock; invalidation bumps it
    /// before taking the same lock.
    async fn insert_if_current(
        &self,
        key: String,
        value: V,
        tags: Vec<&'static str>,
        generation: &AtomicU64,
        expected: u64,
    ) -> bool {
        let mut entries = self.entries.write().await;
        if generation.load(Ordering::SeqCst) != expected {
            return false;
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                tags,
                stored_at: Instant::now(),
            },
        );
        true
    }

    async fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| *t == tag));
        before - entries.len()
    }

    async fn purge_expired(&self, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    }
}

/// Cached per-collection resources and the collection name map
#[derive(Debug)]
pub struct ResourceCache {
    ttl: Duration,
    resources: TaggedMap<Arc<Vec<Resource>>>,
    names: TaggedMap<Arc<HashMap<String, String>>>,
    generation: AtomicU64,
}

const NAMES_KEY: &str = "collection-names";

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            resources: TaggedMap::new(),
            names: TaggedMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current invalidation generation; read it before fetching upstream
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Transformed resources of a collection, if cached and fresh
    pub async fn collection_resources(&self, collection_key: &str) -> Option<Arc<Vec<Resource>>> {
        self.resources.get(collection_key, self.ttl).await
    }

    /// Store resources fetched at `generation`; returns false when an
    /// invalidation happened since and the value was dropped
    pub async fn store_collection_resources(
        &self,
        collection_key: &str,
        resources: Arc<Vec<Resource>>,
        generation: u64,
    ) -> bool {
        self.resources.purge_expired(self.ttl).await;
        self.resources
            .insert_if_current(
                collection_key.to_string(),
                resources,
                vec![RESOURCES_TAG],
                &self.generation,
                generation,
            )
            .await
    }

    /// Collection key → name map, if cached and fresh
    pub async fn collection_names(&self) -> Option<Arc<HashMap<String, String>>> {
        self.names.get(NAMES_KEY, self.ttl).await
    }

    pub async fn store_collection_names(
        &self,
        names: Arc<HashMap<String, String>>,
        generation: u64,
    ) -> bool {
        self.names
            .insert_if_current(
                NAMES_KEY.to_string(),
                names,
                vec![RESOURCES_TAG],
                &self.generation,
                generation,
            )
            .await
    }

    /// Drop every entry carrying `tag`; returns the number removed
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed =
            self.resources.invalidate_tag(tag).await + self.names.invalidate_tag(tag).await;
        tracing::info!(tag = %tag, removed, "Cache tag invalidated");
        removed
    }
}
