//! Upstream change poll
//!
//! Meant to be hit periodically by an external scheduler. Checks every
//! watched collection and invalidates the resource cache when any changed.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::revalidate::iso_timestamp;
use super::CronAuth;
use crate::cache::RESOURCES_TAG;
use crate::library::{collection_name, collection_names};
use crate::AppState;

/// A changed collection in the poll response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedCollection {
    pub key: String,
    pub name: String,
    pub has_changed: bool,
    pub last_version: String,
    pub current_version: String,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub success: bool,
    pub checked: usize,
    pub changed: usize,
    pub timestamp: String,
    pub collections: Vec<ChangedCollection>,
}

/// GET /poll
pub async fn poll_changes(_auth: CronAuth, State(state): State<AppState>) -> Json<PollResponse> {
    let watched = &state.config.watched_collections;
    info!(collections = watched.len(), "Polling upstream for changes");

    let names = collection_names(&state).await;
    let changed = state.detector.poll_for_changes(watched).await;

    if !changed.is_empty() {
        state.cache.invalidate_tag(RESOURCES_TAG).await;
    }

    let collections: Vec<ChangedCollection> = changed
        .into_iter()
        .map(|report| ChangedCollection {
            name: collection_name(&names, &report.key).to_string(),
            key: report.key,
            has_changed: report.has_changed,
            last_version: report.last_version,
            current_version: report.current_version,
        })
        .collect();

    info!(
        checked = watched.len(),
        changed = collections.len(),
        "Poll complete"
    );

    Json(PollResponse {
        success: true,
        checked: watched.len(),
        changed: collections.len(),
        timestamp: iso_timestamp(Utc::now()),
        collections,
    })
}

/// HEAD /poll, for uptime monitors
pub async fn poll_head() -> StatusCode {
    StatusCode::OK
}

pub fn poll_routes() -> Router<AppState> {
    Router::new().route("/poll", get(poll_changes).head(poll_head))
}
