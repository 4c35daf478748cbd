//! Logging setup shared by both binaries

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence; otherwise everything is logged at
/// `default_level`.
pub fn init_logging(default_level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
