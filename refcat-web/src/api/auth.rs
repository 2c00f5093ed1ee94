//! Bearer-token check for the poll endpoint
//!
//! The token is compared with the configured cron secret. Without a
//! configured secret every request is let through and a warning is logged.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{ApiError, AppState};

/// Extractor that succeeds only for an authorized caller
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

#[async_trait]
impl FromRequestParts<AppState> for CronAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.cron_secret() else {
            warn!("No cron secret configured, poll endpoint is unprotected");
            return Ok(CronAuth);
        };

        let provided = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token);

        if provided == Some(expected) {
            Ok(CronAuth)
        } else {
            warn!("Unauthorized poll request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Token of an `Authorization: Bearer <token>` header value
fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim)
}
