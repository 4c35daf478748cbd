use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::clock::utc_iso;
use crate::service::ProbeService;

/// Build the verifier routes:
/// - /health           (liveness, plain text)
/// - /version          (role + environment)
/// - /verify/breaches  (run one probe)
pub fn routes(probe: Arc<ProbeService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/verify/breaches", post(verify_breaches))
        .with_state(probe)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// GET /version
async fn version(State(probe): State<Arc<ProbeService>>) -> Json<serde_json::Value> {
    let config = probe.config();
    Json(json!({
        "app_role": config.app_role,
        "app_env": config.app_env,
        "ts": utc_iso(Utc::now()),
    }))
}

//
// ─────────────────────────────────────────────────────────────
// POST /verify/breaches
// 200 with the probe result if it passed, 500 otherwise
// 500 {"error"} when no target is configured
// ─────────────────────────────────────────────────────────────
//
async fn verify_breaches(State(probe): State<Arc<ProbeService>>) -> Response {
    match probe.verify_configured_target().await {
        Ok(result) => (result.http_status(), Json(result)).into_response(),
        Err(err) => {
            tracing::error!(kind = err.kind(), error = %err, "probe not run");
            err.into_response()
        }
    }
}
