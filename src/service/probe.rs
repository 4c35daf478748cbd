//! Probe Service: synthetic check of the facade's `/breaches` endpoint
//!
//! One probe issues a single GET, validates status, body shape and latency,
//! and archives the resulting [`ProbeResult`]. Validation errors accumulate;
//! nothing short-circuits except a request that never produced a response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::archive::{blob_name, ArchiveError, EvidenceArchive};
use crate::clock::{utc_iso, Clock, SystemClock};
use crate::config::VerifierConfig;
use crate::error::ServiceError;

/// Path probed on the target
pub const PROBE_ENDPOINT: &str = "/breaches";

/// Identity of the verifier that ran the probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifierInfo {
    pub app_role: String,
    pub app_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub base_url: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpObservation {
    /// `None` when no response was received
    pub status_code: Option<u16>,
    pub timeout: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub passed: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub latency_ms: u64,
    pub max_latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub account: Option<String>,
    pub container: String,
    /// Archive key, set only once the write succeeded
    pub blob_name: Option<String>,
}

/// Outcome of one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub timestamp_utc: String,
    pub check_id: String,
    pub verifier: VerifierInfo,
    pub target: TargetInfo,
    pub http: HttpObservation,
    pub validation: Validation,
    pub performance: Performance,
    pub storage: StorageInfo,
}

impl ProbeResult {
    /// 200 when the probe passed, 500 otherwise
    pub fn http_status(&self) -> StatusCode {
        if self.validation.passed {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// What a single GET observed before thresholds are applied
struct Observation {
    status_code: Option<u16>,
    timed_out: bool,
    errors: Vec<String>,
    latency_ms: u64,
}

pub struct ProbeService {
    client: Client,
    archive: Arc<dyn EvidenceArchive>,
    clock: Arc<dyn Clock>,
    config: VerifierConfig,
}

impl ProbeService {
    pub fn new(config: VerifierConfig, archive: Arc<dyn EvidenceArchive>) -> Self {
        Self {
            client: Client::new(),
            archive,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replaces the clock used for the probe timestamp and archive key
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Probes the configured target with the configured thresholds
    ///
    /// Fails only when `TARGET_BASE_URL` is not set.
    pub async fn verify_configured_target(&self) -> Result<ProbeResult, ServiceError> {
        let target = self.config.target_base_url()?;
        Ok(self
            .run_probe(target, self.config.request_timeout, self.config.max_latency_ms)
            .await)
    }

    /// Probes `target_base_url` + `/breaches` once and archives the result
    pub async fn run_probe(
        &self,
        target_base_url: &str,
        timeout: Duration,
        max_latency_ms: u64,
    ) -> ProbeResult {
        let check_id = Uuid::new_v4().to_string();
        let started_at = self.clock.now();
        let base_url = target_base_url.trim_end_matches('/');

        let mut observed = self.observe(&format!("{base_url}{PROBE_ENDPOINT}"), timeout).await;
        if observed.latency_ms > max_latency_ms {
            observed.errors.push(format!(
                "Latency {}ms exceeded threshold {}ms",
                observed.latency_ms, max_latency_ms
            ));
        }

        let passed = observed.errors.is_empty()
            && !observed.timed_out
            && observed.status_code == Some(200);

        let mut result = ProbeResult {
            timestamp_utc: utc_iso(started_at),
            check_id,
            verifier: VerifierInfo {
                app_role: self.config.app_role.clone(),
                app_env: self.config.app_env.clone(),
            },
            target: TargetInfo {
                base_url: base_url.to_string(),
                endpoint: PROBE_ENDPOINT.to_string(),
            },
            http: HttpObservation {
                status_code: observed.status_code,
                timeout: observed.timed_out,
            },
            validation: Validation {
                passed,
                errors: observed.errors,
            },
            performance: Performance {
                latency_ms: observed.latency_ms,
                max_latency_ms,
            },
            storage: StorageInfo {
                account: self.config.storage.account.clone(),
                container: self.config.storage.container.clone(),
                blob_name: None,
            },
        };

        let key = blob_name(started_at, &result.check_id);
        if let Err(err) = self.archive_result(&mut result, key).await {
            let err = ServiceError::from(err);
            tracing::error!(check_id = %result.check_id, kind = err.kind(), error = %err, "failed to archive probe result");
            result.validation.passed = false;
            result.validation.errors.push(err.to_string());
        }

        tracing::info!(
            check_id = %result.check_id,
            status_code = ?result.http.status_code,
            latency_ms = result.performance.latency_ms,
            passed = result.validation.passed,
            "probe finished"
        );
        result
    }

    async fn observe(&self, url: &str, timeout: Duration) -> Observation {
        let mut status_code = None;
        let mut timed_out = false;
        let mut errors = Vec::new();

        let start = Instant::now();
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let status = response.status();
                status_code = Some(status.as_u16());
                if status != StatusCode::OK {
                    errors.push(format!("Expected 200, got {}", status.as_u16()));
                }
                match response.bytes().await {
                    Ok(body) => errors.extend(body_shape_error(&body)),
                    Err(e) if e.is_timeout() => {
                        timed_out = true;
                        errors.push(timeout_message(timeout));
                    }
                    Err(e) => errors.push(format!("Request failed: {e}")),
                }
            }
            Err(e) if e.is_timeout() => {
                timed_out = true;
                errors.push(timeout_message(timeout));
            }
            Err(e) => errors.push(format!("Request failed: {e}")),
        }
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        Observation {
            status_code,
            timed_out,
            errors,
            latency_ms,
        }
    }

    /// Writes `result` under `key`; `blob_name` is kept only on success
    async fn archive_result(&self, result: &mut ProbeResult, key: String) -> Result<(), ArchiveError> {
        result.storage.blob_name = Some(key.clone());
        let written = match serde_json::to_vec_pretty(result) {
            Ok(bytes) => self.archive.write(&key, bytes).await,
            Err(e) => Err(e.into()),
        };
        if written.is_err() {
            result.storage.blob_name = None;
        }
        written
    }
}

/// Validation error for a body that is not a JSON array or object
fn body_shape_error(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body) {
        Err(e) => Some(format!("Invalid JSON: {e}")),
        Ok(Value::Array(_) | Value::Object(_)) => None,
        Ok(other) => Some(format!("Unexpected JSON type: {}", json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn timeout_message(timeout: Duration) -> String {
    if timeout.subsec_nanos() == 0 {
        format!("Timeout after {}s", timeout.as_secs())
    } else {
        format!("Timeout after {}s", timeout.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> VerifierConfig {
        VerifierConfig::from_lookup(|name| match name {
            "STORAGE_ACCOUNT_NAME" => Some("evidence".to_string()),
            "APP_ENV" => Some("test".to_string()),
            _ => None,
        })
    }

    fn service(archive: Arc<MemoryArchive>) -> ProbeService {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()));
        ProbeService::new(test_config(), archive).with_clock(clock)
    }

    async fn target(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROBE_ENDPOINT))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_healthy_target_passes_and_is_archived() {
        let server = target(ResponseTemplate::new(200).set_body_json(json!([{ "Name": "x" }]))).await;
        let archive = Arc::new(MemoryArchive::new());

        let result = service(archive.clone())
            .run_probe(&server.uri(), Duration::from_secs(5), 1500)
            .await;

        assert!(result.validation.passed, "errors: {:?}", result.validation.errors);
        assert!(result.validation.errors.is_empty());
        assert_eq!(result.http.status_code, Some(200));
        assert!(!result.http.timeout);
        assert_eq!(result.http_status(), StatusCode::OK);
        assert_eq!(result.timestamp_utc, "2024-05-06T07:08:09Z");
        assert_eq!(result.target.endpoint, "/breaches");
        assert_eq!(result.storage.account.as_deref(), Some("evidence"));
        assert_eq!(result.storage.container, "results-raw");
        assert_eq!(result.verifier.app_env, "test");

        let key = result.storage.blob_name.clone().expect("blob name set after write");
        assert_eq!(key, format!("2024/05/06/070809Z-{}.json", result.check_id));

        let archived: ProbeResult = serde_json::from_slice(&archive.get(&key).unwrap()).unwrap();
        assert_eq!(archived, result);
    }

    #[tokio::test]
    async fn test_non_200_fails_but_still_archives() {
        let server = target(ResponseTemplate::new(503).set_body_json(json!({ "message": "down" }))).await;
        let archive = Arc::new(MemoryArchive::new());

        let result = service(archive.clone())
            .run_probe(&server.uri(), Duration::from_secs(5), 1500)
            .await;

        assert!(!result.validation.passed);
        assert_eq!(result.validation.errors, vec!["Expected 200, got 503".to_string()]);
        assert_eq!(result.http.status_code, Some(503));
        assert_eq!(result.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(archive.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_errors_accumulate() {
        let server = target(ResponseTemplate::new(500).set_body_string("oops")).await;
        let archive = Arc::new(MemoryArchive::new());

        let result = service(archive)
            .run_probe(&server.uri(), Duration::from_secs(5), 1500)
            .await;

        assert_eq!(result.validation.errors.len(), 2);
        assert_eq!(result.validation.errors[0], "Expected 200, got 500");
        assert!(result.validation.errors[1].starts_with("Invalid JSON: "));
    }

    #[tokio::test]
    async fn test_scalar_json_is_unexpected_type() {
        let server = target(ResponseTemplate::new(200).set_body_string("\"hello\"")).await;

        let result = service(Arc::new(MemoryArchive::new()))
            .run_probe(&server.uri(), Duration::from_secs(5), 1500)
            .await;

        assert!(!result.validation.passed);
        assert_eq!(result.validation.errors, vec!["Unexpected JSON type: string".to_string()]);
    }

    #[tokio::test]
    async fn test_slow_target_exceeds_latency_threshold() {
        let server = target(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .await;

        let result = service(Arc::new(MemoryArchive::new()))
            .run_probe(&server.uri(), Duration::from_secs(5), 50)
            .await;

        assert!(!result.validation.passed);
        assert!(result.performance.latency_ms >= 300);
        assert_eq!(result.performance.max_latency_ms, 50);
        assert_eq!(result.validation.errors.len(), 1);
        assert!(result.validation.errors[0].starts_with("Latency "));
        assert!(result.validation.errors[0].ends_with("exceeded threshold 50ms"));
    }

    #[tokio::test]
    async fn test_timeout_is_flagged() {
        let server = target(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let result = service(Arc::new(MemoryArchive::new()))
            .run_probe(&server.uri(), Duration::from_millis(250), 10_000)
            .await;

        assert!(result.http.timeout);
        assert!(result.http.status_code.is_none());
        assert!(!result.validation.passed);
        assert_eq!(result.validation.errors, vec!["Timeout after 0.25s".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_target_reports_request_failure() {
        let result = service(Arc::new(MemoryArchive::new()))
            .run_probe("http://127.0.0.1:9", Duration::from_secs(2), 10_000)
            .await;

        assert!(!result.validation.passed);
        assert!(result.http.status_code.is_none());
        assert!(result.validation.errors[0].starts_with("Request failed: ")
            || result.validation.errors[0].starts_with("Timeout after"));
    }

    #[tokio::test]
    async fn test_archive_failure_degrades_passing_probe() {
        let server = target(ResponseTemplate::new(200).set_body_json(json!([]))).await;
        let archive = Arc::new(MemoryArchive::failing("container not found"));

        let result = service(archive)
            .run_probe(&server.uri(), Duration::from_secs(5), 1500)
            .await;

        assert!(!result.validation.passed);
        assert_eq!(
            result.validation.errors,
            vec!["Storage write failed: container not found".to_string()]
        );
        assert!(result.storage.blob_name.is_none());
        assert_eq!(result.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_trailing_slash_in_target_is_ignored() {
        let server = target(ResponseTemplate::new(200).set_body_json(json!([]))).await;

        let result = service(Arc::new(MemoryArchive::new()))
            .run_probe(&format!("{}/", server.uri()), Duration::from_secs(5), 1500)
            .await;

        assert!(result.validation.passed);
        assert_eq!(result.target.base_url, server.uri());
    }

    #[tokio::test]
    async fn test_missing_target_is_configuration_error() {
        let probe = service(Arc::new(MemoryArchive::new()));

        let err = probe.verify_configured_target().await.unwrap_err();

        assert!(matches!(err, ServiceError::MissingConfiguration(_)));
        assert_eq!(err.to_string(), "Missing TARGET_BASE_URL app setting");
    }

    #[test]
    fn test_body_shape_checks() {
        assert!(body_shape_error(b"[]").is_none());
        assert!(body_shape_error(b"{\"a\":1}").is_none());
        assert_eq!(body_shape_error(b"null").as_deref(), Some("Unexpected JSON type: null"));
        assert_eq!(body_shape_error(b"42").as_deref(), Some("Unexpected JSON type: number"));
        assert!(body_shape_error(b"").unwrap().starts_with("Invalid JSON"));
    }

    #[test]
    fn test_timeout_message_formats_whole_seconds() {
        assert_eq!(timeout_message(Duration::from_secs(10)), "Timeout after 10s");
        assert_eq!(timeout_message(Duration::from_millis(1500)), "Timeout after 1.5s");
    }
}
