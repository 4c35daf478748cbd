//! Environment-driven configuration for both services
//!
//! Settings are read through a lookup function so tests can supply a map
//! instead of mutating the process environment. Integer settings fall back to
//! their default when unset, blank, or unparseable.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::data::HIBP_BREACHES_URL;

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 1800;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_MAX_LATENCY_MS: u64 = 1500;
pub const DEFAULT_RESULTS_CONTAINER: &str = "results-raw";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting the operation cannot run without is absent
    #[error("Missing {0} app setting")]
    Missing(&'static str),
}

/// Settings for the breach facade
#[derive(Debug, Clone)]
pub struct BreachConfig {
    /// How long a fetched payload counts as fresh
    pub cache_ttl: Duration,
    /// Timeout applied to each upstream call
    pub request_timeout: Duration,
    /// Feed URL
    pub upstream_url: String,
    pub app_name: String,
    pub app_version: String,
    pub app_env: String,
}

impl BreachConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            cache_ttl: Duration::from_secs(env_u64(
                &lookup,
                "CACHE_TTL_SECONDS",
                DEFAULT_CACHE_TTL_SECONDS,
            )),
            request_timeout: Duration::from_secs(env_u64(
                &lookup,
                "REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )),
            upstream_url: env_string(&lookup, "UPSTREAM_URL")
                .unwrap_or_else(|| HIBP_BREACHES_URL.to_string()),
            app_name: env_string(&lookup, "APP_NAME").unwrap_or_else(|| "breach-tracker".to_string()),
            app_version: env_string(&lookup, "APP_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            app_env: env_string(&lookup, "APP_ENV").unwrap_or_else(|| "dev".to_string()),
        }
    }
}

/// Where probe evidence is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Azure-Blob-compatible REST endpoint
    Blob,
    /// Directory on the local filesystem
    Local,
}

/// Evidence archive settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub account: Option<String>,
    pub container: String,
    /// SAS query string appended to blob PUTs
    pub sas_token: Option<String>,
    /// Overrides `https://<account>.blob.core.windows.net`
    pub blob_endpoint: Option<String>,
    /// Root of the local archive
    pub results_dir: Option<PathBuf>,
}

impl StorageConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let backend = match env_string(lookup, "STORAGE_BACKEND").as_deref() {
            Some(b) if b.eq_ignore_ascii_case("local") => StorageBackend::Local,
            _ => StorageBackend::Blob,
        };
        Self {
            backend,
            account: env_string(lookup, "STORAGE_ACCOUNT_NAME"),
            container: env_string(lookup, "RESULTS_RAW_CONTAINER")
                .unwrap_or_else(|| DEFAULT_RESULTS_CONTAINER.to_string()),
            sas_token: env_string(lookup, "STORAGE_SAS_TOKEN"),
            blob_endpoint: env_string(lookup, "STORAGE_BLOB_ENDPOINT"),
            results_dir: env_string(lookup, "RESULTS_DIR").map(PathBuf::from),
        }
    }
}

/// Settings for the verifier
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Base URL of the facade under test, without trailing `/`
    pub target_base_url: Option<String>,
    pub request_timeout: Duration,
    pub max_latency_ms: u64,
    pub app_role: String,
    pub app_env: String,
    pub storage: StorageConfig,
}

impl VerifierConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            target_base_url: env_string(&lookup, "TARGET_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            request_timeout: Duration::from_secs(env_u64(
                &lookup,
                "REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )),
            max_latency_ms: env_u64(&lookup, "EXPECTED_MAX_LATENCY_MS", DEFAULT_MAX_LATENCY_MS),
            app_role: env_string(&lookup, "APP_ROLE").unwrap_or_else(|| "verifier".to_string()),
            app_env: env_string(&lookup, "APP_ENV").unwrap_or_else(|| "dev".to_string()),
            storage: StorageConfig::from_lookup(&lookup),
        }
    }

    pub fn target_base_url(&self) -> Result<&str, ConfigError> {
        self.target_base_url
            .as_deref()
            .ok_or(ConfigError::Missing("TARGET_BASE_URL"))
    }
}

/// Trimmed value of `name`, `None` when unset or blank
fn env_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: u64) -> u64 {
    match env_string(lookup, name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(setting = name, value = %raw, default, "ignoring unparseable setting");
            default
        }),
        None => default,
    }
}
