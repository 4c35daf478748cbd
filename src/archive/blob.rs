//! Azure-Blob-compatible evidence archive
//!
//! Uploads each result as a block blob with a single `Put Blob` request.
//! Authorization is a SAS token appended to the URL; without one the request
//! is sent unsigned, which works against public emulator containers only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use super::{ArchiveError, EvidenceArchive};

/// Storage REST API version sent with every request
const STORAGE_API_VERSION: &str = "2021-08-06";

/// Upper bound on a single upload
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BlobArchive {
    client: Client,
    /// `<endpoint>/<container>` without trailing slash
    container_url: String,
    sas_token: Option<String>,
}

impl BlobArchive {
    /// Creates an archive for `container` in `account`
    ///
    /// `endpoint` overrides the public `https://<account>.blob.core.windows.net`
    /// endpoint (e.g. for Azurite).
    pub fn new(
        account: &str,
        container: &str,
        endpoint: Option<&str>,
        sas_token: Option<String>,
    ) -> Self {
        let endpoint = match endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{account}.blob.core.windows.net"),
        };
        Self {
            client: Client::new(),
            container_url: format!("{endpoint}/{container}"),
            sas_token: sas_token.map(|t| t.trim_start_matches('?').to_string()),
        }
    }

    fn blob_url(&self, key: &str) -> String {
        match &self.sas_token {
            Some(sas) => format!("{}/{}?{}", self.container_url, key, sas),
            None => format!("{}/{}", self.container_url, key),
        }
    }
}

#[async_trait]
impl EvidenceArchive for BlobArchive {
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<(), ArchiveError> {
        let response = self
            .client
            .put(self.blob_url(key))
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(UPLOAD_TIMEOUT)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status(status));
        }

        tracing::debug!(container = %self.container_url, key, "uploaded evidence blob");
        Ok(())
    }
}
