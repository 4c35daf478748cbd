//! Command-line interface parsing for both binaries
//!
//! Only the listener and log level come from the command line; service
//! settings are environment-driven (see `config`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::{Args, Parser};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Default port of the breach facade
pub const FACADE_DEFAULT_PORT: u16 = 8080;

/// Default port of the verifier
pub const VERIFIER_DEFAULT_PORT: u16 = 8081;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified log level is not recognized
    #[error("Invalid log level: '{0}'. Valid levels: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Listener and logging options shared by both binaries
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Default log level when RUST_LOG is not set
    ///
    /// Valid levels: trace, debug, info, warn, error
    #[arg(long, value_name = "LEVEL", default_value = "info", value_parser = parse_log_level)]
    pub log_level: LevelFilter,
}

impl ServeArgs {
    /// Address to listen on, using `default_port` when none was given
    pub fn socket_addr(&self, default_port: u16) -> SocketAddr {
        SocketAddr::new(self.host, self.port.unwrap_or(default_port))
    }
}

/// Breach Tracker - cached facade for the breach disclosure feed
#[derive(Parser, Debug)]
#[command(name = "breach-tracker")]
#[command(about = "Serve the breach feed from a time-bounded cache")]
#[command(version)]
pub struct FacadeCli {
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Breach Verifier - probes the facade and archives evidence
#[derive(Parser, Debug)]
#[command(name = "breach-verifier")]
#[command(about = "Probe the breach facade and archive each result")]
#[command(version)]
pub struct VerifierCli {
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Parses a log level name into a `LevelFilter`.
///
/// # Arguments
/// * `s` - The level name from the CLI, case-insensitive
///
/// # Returns
/// * `Ok(LevelFilter)` if the name is a known level
/// * `Err(CliError::InvalidLogLevel)` otherwise
pub fn parse_log_level(s: &str) -> Result<LevelFilter, CliError> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => Err(CliError::InvalidLogLevel(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level_case_insensitive() {
        assert_eq!(parse_log_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("WARN").unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn test_parse_log_level_invalid() {
        let result = parse_log_level("loud");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_facade_cli_defaults() {
        let cli = FacadeCli::parse_from(["breach-tracker", "--host", "0.0.0.0"]);
        assert_eq!(cli.serve.log_level, LevelFilter::INFO);

        let serve = ServeArgs { port: None, ..cli.serve };
        assert_eq!(
            serve.socket_addr(FACADE_DEFAULT_PORT),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_verifier_cli_port_and_host() {
        let cli = VerifierCli::parse_from([
            "breach-verifier",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            cli.serve.socket_addr(VERIFIER_DEFAULT_PORT),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(cli.serve.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn test_cli_rejects_bad_port() {
        assert!(FacadeCli::try_parse_from(["breach-tracker", "--port", "http"]).is_err());
    }
}
