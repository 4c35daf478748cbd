//! Service-level error taxonomy
//!
//! Boundary errors ([`FetchError`], [`ArchiveError`], [`ConfigError`]) are
//! folded into [`ServiceError`] where they leave a service. Rendering always
//! produces a JSON body; the status code is the pass/fail signal.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::data::FetchError;

/// Message returned when the feed is down and nothing was ever cached
pub const NO_CACHE_MESSAGE: &str = "error and no cache available";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Upstream failed; recovered locally when a stale payload exists
    #[error("{0}")]
    UpstreamUnavailable(#[from] FetchError),

    /// Upstream failed and the cache has never been populated
    #[error("{NO_CACHE_MESSAGE}: {0}")]
    NoCacheAvailable(FetchError),

    /// Evidence could not be persisted
    #[error("Storage write failed: {0}")]
    ArchiveWriteFailed(#[from] ArchiveError),

    /// A required setting is absent
    #[error(transparent)]
    MissingConfiguration(#[from] ConfigError),
}

impl ServiceError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::UpstreamUnavailable(_) => "upstream_unavailable",
            ServiceError::NoCacheAvailable(_) => "no_cache_available",
            ServiceError::ArchiveWriteFailed(_) => "archive_write_failed",
            ServiceError::MissingConfiguration(_) => "missing_configuration",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServiceError::NoCacheAvailable(cause) => json!({
                "message": NO_CACHE_MESSAGE,
                "error": cause.to_string(),
            }),
            other => json!({ "error": other.to_string() }),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
