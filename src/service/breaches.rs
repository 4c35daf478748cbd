//! Breach Service: cache-fronted fetch with stale fallback
//!
//! Each call walks one of three paths:
//! - fresh cache: serve it without touching upstream
//! - stale or empty cache: fetch upstream, sort, replace the cache, serve
//! - upstream failure: serve the stale payload if any, otherwise fail
//!
//! Concurrent misses each call upstream independently; the last successful
//! fetch wins the cache slot.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStore, CachedData};
use crate::data::{sort_by_modified_desc, BreachRecord, BreachSource, FetchError};
use crate::error::ServiceError;

pub const FRESH_CACHE_MESSAGE: &str = "served from fresh cache";
pub const FETCHED_MESSAGE: &str = "fetched successfully";
pub const STALE_CACHE_MESSAGE: &str = "upstream fetch failed; returning stale cache";

/// JSON body of a successful `GET /breaches`
#[derive(Debug, Clone, Serialize)]
pub struct BreachEnvelope {
    pub message: &'static str,
    pub cached: bool,
    pub stale: bool,
    /// Present whenever the payload came from the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<u64>,
    /// Cache TTL in seconds
    pub ttl: u64,
    /// Upstream failure cause when serving stale data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub breaches: Arc<Vec<BreachRecord>>,
}

/// JSON body of `GET /ready`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON body of `GET /health`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Clone)]
pub struct BreachService {
    cache: Arc<CacheStore>,
    source: Arc<dyn BreachSource>,
}

impl BreachService {
    pub fn new(cache: Arc<CacheStore>, source: Arc<dyn BreachSource>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Serves the breach feed, refreshing the cache when it is not fresh
    ///
    /// # Returns
    /// * `Ok(BreachEnvelope)` - fresh cache, new fetch, or stale fallback (all HTTP 200)
    /// * `Err(ServiceError::NoCacheAvailable)` - upstream failed and nothing was ever cached
    pub async fn get_breaches(&self) -> Result<BreachEnvelope, ServiceError> {
        if let Some(cached) = self.cache.read() {
            if !cached.is_expired {
                tracing::debug!(age_seconds = cached.age_seconds, "serving breaches from fresh cache");
                return Ok(self.cached_envelope(FRESH_CACHE_MESSAGE, cached, None));
            }
        }

        match self.source.fetch_breaches().await {
            Ok(mut records) => {
                sort_by_modified_desc(&mut records);
                let breaches = self.cache.replace(records);
                tracing::info!(count = breaches.len(), "refreshed breach cache from upstream");

                Ok(BreachEnvelope {
                    message: FETCHED_MESSAGE,
                    cached: false,
                    stale: false,
                    cache_age_seconds: None,
                    ttl: self.ttl_seconds(),
                    error: None,
                    breaches,
                })
            }
            Err(err) => self.fall_back(err),
        }
    }

    fn fall_back(&self, err: FetchError) -> Result<BreachEnvelope, ServiceError> {
        tracing::warn!(error = %err, "upstream breach fetch failed");

        match self.cache.read() {
            Some(stale) => {
                tracing::warn!(age_seconds = stale.age_seconds, "serving stale breach cache");
                let cause = err.to_string();
                Ok(self.cached_envelope(STALE_CACHE_MESSAGE, stale, Some(cause)))
            }
            None => {
                let err = ServiceError::NoCacheAvailable(err);
                tracing::error!(kind = err.kind(), error = %err, "no breach data to serve");
                Err(err)
            }
        }
    }

    fn cached_envelope(
        &self,
        message: &'static str,
        cached: CachedData,
        error: Option<String>,
    ) -> BreachEnvelope {
        BreachEnvelope {
            message,
            cached: true,
            stale: error.is_some(),
            cache_age_seconds: Some(cached.age_seconds),
            ttl: self.ttl_seconds(),
            error,
            breaches: cached.data,
        }
    }

    fn ttl_seconds(&self) -> u64 {
        self.cache.ttl().as_secs()
    }

    /// Liveness never depends on upstream or cache state
    pub fn health(&self) -> Health {
        Health { status: "ok" }
    }

    /// Ready when there is anything to serve, or when upstream answers
    ///
    /// Never modifies the cache.
    pub async fn readiness(&self) -> Readiness {
        if self.cache.has_payload() {
            return Readiness {
                ready: true,
                reason: "cache populated",
                error: None,
            };
        }

        match self.source.check_reachable().await {
            Ok(()) => Readiness {
                ready: true,
                reason: "upstream reachable",
                error: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "readiness check failed");
                Readiness {
                    ready: false,
                    reason: "upstream unreachable",
                    error: Some(err.to_string()),
                }
            }
        }
    }
}
