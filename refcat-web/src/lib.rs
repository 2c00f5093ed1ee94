//! refcat-web library - reference catalog HTTP service
//!
//! Fetches items from a Zotero library, reshapes them into display
//! resources and serves them with filtering, pagination and an upstream
//! change poll that invalidates the resource cache.

use axum::Router;
use refcat_common::config::TomlConfig;
use refcat_common::versions::VersionStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod error;
pub mod library;
pub mod pagination;
pub mod poller;
pub mod zotero;

pub use error::{ApiError, ApiResult};

use cache::ResourceCache;
use poller::{ChangeDetector, VersionTracker};
use zotero::CatalogSource;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream library
    pub source: Arc<dyn CatalogSource>,
    /// Version tracking and change detection
    pub detector: ChangeDetector,
    /// Transformed resources, tagged for invalidation
    pub cache: Arc<ResourceCache>,
    pub config: Arc<TomlConfig>,
    /// Server startup time for uptime reporting
    pub startup_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: TomlConfig,
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn VersionStore>,
    ) -> Self {
        let cache = ResourceCache::new(Duration::from_secs(config.cache_ttl_secs));
        let detector = ChangeDetector::new(source.clone(), VersionTracker::new(store));

        Self {
            source,
            detector,
            cache: Arc::new(cache),
            config: Arc::new(config),
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::poll_routes())
        .merge(api::resource_routes())
        .merge(api::revalidate_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
