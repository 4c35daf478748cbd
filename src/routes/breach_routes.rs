use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::clock::utc_iso;
use crate::config::BreachConfig;
use crate::service::BreachService;

/// Shared state of the facade routes
#[derive(Clone)]
pub struct FacadeState {
    pub service: BreachService,
    pub config: BreachConfig,
}

/// Build the facade routes:
/// - /breaches  (cached feed)
/// - /health    (liveness)
/// - /version   (build metadata)
/// - /ready     (readiness)
pub fn routes(state: FacadeState) -> Router {
    Router::new()
        .route("/breaches", get(get_breaches))
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/ready", get(ready))
        .with_state(state)
}

//
// ─────────────────────────────────────────────────────────────
// GET /breaches
// 200 with the envelope (fresh, fetched or stale), 500 if nothing to serve
// ─────────────────────────────────────────────────────────────
//
async fn get_breaches(State(state): State<FacadeState>) -> Response {
    match state.service.get_breaches().await {
        Ok(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /health
async fn health(State(state): State<FacadeState>) -> impl IntoResponse {
    Json(state.service.health())
}

/// GET /version
async fn version(State(state): State<FacadeState>) -> Json<serde_json::Value> {
    Json(json!({
        "app": state.config.app_name,
        "version": state.config.app_version,
        "environment": state.config.app_env,
        "utc": utc_iso(Utc::now()),
    }))
}

//
// ─────────────────────────────────────────────────────────────
// GET /ready
// 200 when there is data to serve or upstream answers, 503 otherwise
// ─────────────────────────────────────────────────────────────
//
async fn ready(State(state): State<FacadeState>) -> impl IntoResponse {
    let readiness = state.service.readiness().await;
    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}
