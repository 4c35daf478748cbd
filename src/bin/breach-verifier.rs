//! Breach Verifier - probe the breach facade and archive each result
//!
//! Exposes `/health`, `/version` and `POST /verify/breaches`. The target and
//! archive are configured through the environment (optionally seeded from `.env`).

use clap::Parser;
use tokio::net::TcpListener;

use breach_tracker::app;
use breach_tracker::cli::{VerifierCli, VERIFIER_DEFAULT_PORT};
use breach_tracker::config::VerifierConfig;
use breach_tracker::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = VerifierCli::parse();
    telemetry::init_logging(cli.serve.log_level);

    let config = VerifierConfig::from_env();
    match config.target_base_url() {
        Ok(target_url) => tracing::info!(target_url, "starting verifier"),
        Err(e) => tracing::warn!("{}; probes will fail until it is set", e),
    }

    let router = app::build_verifier_app(config);

    let addr = cli.serve.socket_addr(VERIFIER_DEFAULT_PORT);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(app::shutdown_signal())
        .await?;

    Ok(())
}
