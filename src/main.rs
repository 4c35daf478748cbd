//! Breach Tracker - serve the breach disclosure feed from a time-bounded cache
//!
//! Exposes `/breaches`, `/health`, `/version` and `/ready`. Configuration is
//! read from the environment (optionally seeded from `.env`).

use clap::Parser;
use tokio::net::TcpListener;

use breach_tracker::app;
use breach_tracker::cli::{FacadeCli, FACADE_DEFAULT_PORT};
use breach_tracker::config::BreachConfig;
use breach_tracker::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = FacadeCli::parse();
    telemetry::init_logging(cli.serve.log_level);

    let config = BreachConfig::from_env();
    tracing::info!(
        ttl_seconds = config.cache_ttl.as_secs(),
        timeout_seconds = config.request_timeout.as_secs(),
        upstream = %config.upstream_url,
        "starting breach facade"
    );

    let router = app::build_app(config);

    let addr = cli.serve.socket_addr(FACADE_DEFAULT_PORT);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(app::shutdown_signal())
        .await?;

    Ok(())
}
