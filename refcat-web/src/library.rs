//! Cached access to transformed collection contents

use refcat_common::transform::{transform_items, CollectionContext};
use refcat_common::Resource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::zotero::ZoteroError;
use crate::AppState;

/// Name shown for a collection missing from the upstream list
pub const UNKNOWN_COLLECTION_NAME: &str = "Unknown";

/// Collection key → display name map
///
/// `complete` is false when the upstream list couldn't be fetched and the
/// map is an empty stand-in.
#[derive(Debug, Clone)]
pub struct CollectionNames {
    names: Arc<HashMap<String, String>>,
    complete: bool,
}

impl CollectionNames {
    fn fetched(names: Arc<HashMap<String, String>>) -> Self {
        Self {
            names,
            complete: true,
        }
    }

    fn unavailable() -> Self {
        Self {
            names: Arc::new(HashMap::new()),
            complete: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Collection names, cached
///
/// Degrades to an empty, incomplete map when the upstream list can't be
/// fetched; the failure isn't cached.
pub async fn collection_names(state: &AppState) -> CollectionNames {
    if let Some(names) = state.cache.collection_names().await {
        return CollectionNames::fetched(names);
    }

    let generation = state.cache.generation();
    match state.source.fetch_collections().await {
        Ok(collections) => {
            let names: HashMap<String, String> =
                collections.into_iter().map(|c| (c.key, c.name)).collect();
            let names = Arc::new(names);
            state
                .cache
                .store_collection_names(names.clone(), generation)
                .await;
            CollectionNames::fetched(names)
        }
        Err(e) => {
            warn!(error = %e, "Could not fetch collection names");
            CollectionNames::unavailable()
        }
    }
}

/// Display name for a collection key
pub fn collection_name<'a>(names: &'a CollectionNames, key: &str) -> &'a str {
    names.get(key).unwrap_or(UNKNOWN_COLLECTION_NAME)
}

/// Transformed resources of one collection, served from cache when fresh
///
/// Results built without a complete name map, or fetched across a cache
/// invalidation, are returned but not cached.
pub async fn load_collection(
    state: &AppState,
    collection_key: &str,
    names: &CollectionNames,
) -> Result<Arc<Vec<Resource>>, ZoteroError> {
    if let Some(resources) = state.cache.collection_resources(collection_key).await {
        debug!(collection = %collection_key, "Serving collection from cache");
        return Ok(resources);
    }

    let generation = state.cache.generation();
    let raws = state
        .source
        .fetch_items_from_collection(collection_key, state.config.fetch_limit)
        .await?;

    let context = CollectionContext::new(
        names.get(collection_key).unwrap_or_default(),
        collection_key,
    );
    let resources = Arc::new(transform_items(&raws, &context));

    if !names.is_complete() {
        debug!(collection = %collection_key, "Collection names unavailable, not caching");
    } else if !state
        .cache
        .store_collection_resources(collection_key, resources.clone(), generation)
        .await
    {
        debug!(collection = %collection_key, "Cache invalidated during fetch, not caching");
    }

    Ok(resources)
}
