//! Upstream reference-manager access
//!
//! [`CatalogSource`] is the seam between the HTTP layer and the upstream
//! API; [`ZoteroClient`] is the production implementation.

mod client;

pub use client::ZoteroClient;

use async_trait::async_trait;
use refcat_common::model::{CollectionInfo, RawItem};
use std::future::Future;
use thiserror::Error;
use tracing::warn;

/// Items per upstream request (the API maximum)
pub const PAGE_SIZE: usize = 100;

/// Upstream client errors
#[derive(Debug, Error)]
pub enum ZoteroError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: check the API key and library permissions")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ZoteroError>,
    },
}

impl ZoteroError {
    /// Wrap with a description of the failed operation
    pub fn context(self, context: impl Into<String>) -> Self {
        ZoteroError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True when the innermost error is a 404
    pub fn is_not_found(&self) -> bool {
        match self {
            ZoteroError::NotFound(_) => true,
            ZoteroError::Context { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Read access to the upstream library
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All collections in the library
    async fn fetch_collections(&self) -> Result<Vec<CollectionInfo>, ZoteroError>;

    /// Top-level items of a collection, at most `limit`
    async fn fetch_items_from_collection(
        &self,
        collection_key: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, ZoteroError>;

    /// A single item by key
    async fn fetch_item(&self, item_key: &str) -> Result<RawItem, ZoteroError>;

    /// Top-level items matching a quick-search query
    async fn search_items(&self, query: &str, limit: usize) -> Result<Vec<RawItem>, ZoteroError>;

    /// Current upstream version token for a collection, `None` when the
    /// response carries no version header
    async fn collection_version(&self, collection_key: &str)
        -> Result<Option<String>, ZoteroError>;
}

/// Collect pages of [`PAGE_SIZE`] until a short page or `limit` items
///
/// `fetch_page` receives the start offset. The result is truncated to
/// `limit`. The first failing page aborts the whole fetch.
pub async fn fetch_paged<T, F, Fut>(limit: usize, mut fetch_page: F) -> Result<Vec<T>, ZoteroError>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ZoteroError>>,
{
    let mut all = Vec::new();
    if limit == 0 {
        return Ok(all);
    }

    let mut start = 0;
    loop {
        let page = fetch_page(start).await?;
        let short_page = page.len() < PAGE_SIZE;
        all.extend(page);

        if short_page || all.len() >= limit {
            break;
        }
        start += PAGE_SIZE;
    }

    all.truncate(limit);
    Ok(all)
}

/// Collections an item belongs to
///
/// Degrades to an empty list when the collection list can't be fetched.
pub async fn fetch_item_collections(
    source: &dyn CatalogSource,
    item: &RawItem,
) -> Vec<CollectionInfo> {
    if item.data.collections.is_empty() {
        return Vec::new();
    }

    match source.fetch_collections().await {
        Ok(collections) => collections
            .into_iter()
            .filter(|c| item.data.collections.contains(&c.key))
            .collect(),
        Err(e) => {
            warn!(item = %item.key, error = %e, "Could not fetch collections for item");
            Vec::new()
        }
    }
}
