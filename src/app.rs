use std::sync::Arc;

use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, HttpMakeClassifier, TraceLayer};
use tracing::Level;

use crate::archive;
use crate::cache::CacheStore;
use crate::config::{BreachConfig, VerifierConfig};
use crate::data::{BreachSource, UpstreamClient};
use crate::routes::breach_routes::{self, FacadeState};
use crate::routes::verifier_routes;
use crate::service::{BreachService, ProbeService};

/// Build the facade application with the real upstream client.
pub fn build_app(config: BreachConfig) -> Router {
    let source = Arc::new(UpstreamClient::with_url(
        config.upstream_url.clone(),
        config.request_timeout,
    ));
    let cache = Arc::new(CacheStore::new(config.cache_ttl));
    build_app_with(config, cache, source)
}

/// Build the facade application around an explicit cache and upstream.
///
/// The cache is owned by the caller so tests can inspect or pre-seed it.
pub fn build_app_with(
    config: BreachConfig,
    cache: Arc<CacheStore>,
    source: Arc<dyn BreachSource>,
) -> Router {
    let state = FacadeState {
        service: BreachService::new(cache, source),
        config,
    };

    breach_routes::routes(state).layer(trace_layer())
}

/// Build the verifier application, selecting the archive from `config`.
pub fn build_verifier_app(config: VerifierConfig) -> Router {
    let archive = archive::from_config(&config.storage);
    build_verifier_app_with(ProbeService::new(config, archive))
}

pub fn build_verifier_app_with(probe: ProbeService) -> Router {
    verifier_routes::routes(Arc::new(probe)).layer(trace_layer())
}

/// Logging middleware
fn trace_layer() -> TraceLayer<HttpMakeClassifier> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

/// Resolves on Ctrl-C so `axum::serve` can drain in-flight requests
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
