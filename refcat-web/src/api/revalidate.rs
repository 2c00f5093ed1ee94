//! Manual cache revalidation

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::cache::RESOURCES_TAG;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidateResponse {
    pub success: bool,
    pub message: String,
    pub revalidated_at: String,
}

/// POST /revalidate
///
/// Drops every cached catalog entry so the next listing refetches upstream.
pub async fn revalidate(State(state): State<AppState>) -> Json<RevalidateResponse> {
    state.cache.invalidate_tag(RESOURCES_TAG).await;

    Json(RevalidateResponse {
        success: true,
        message: "Cache revalidated successfully".to_string(),
        revalidated_at: iso_timestamp(Utc::now()),
    })
}

/// RFC 3339 with millisecond precision and a `Z` suffix
pub(crate) fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn revalidate_routes() -> Router<AppState> {
    Router::new().route("/revalidate", post(revalidate))
}
