use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::covers::{CoverSource, StoredCover, UploadedCover};
use crate::infrastructure::object_store::{ObjectStore, StoreError};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Content type used for remote-sourced covers. The remote server's declared
/// type is not trusted; generated images are PNG.
const REMOTE_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cover transfer failed: {0}")]
    TransferFailed(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::TransferFailed(err.to_string())
    }
}

/// Normalizes a cover source into one durable, publicly resolvable URL.
///
/// Uploaded bytes go straight to the object store; remote URLs (typically
/// temporary generator output) are fetched first and then stored. Every
/// path is single-attempt: a fetch or store failure aborts the enclosing
/// create/update, and at most one orphaned object may be left behind if the
/// backend write partially succeeded.
#[derive(Clone)]
pub struct CoverPipeline {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
}

impl CoverPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, http: reqwest::Client) -> Self {
        Self { store, http }
    }

    pub async fn resolve(&self, source: CoverSource) -> Result<StoredCover, PipelineError> {
        match source {
            CoverSource::None => Ok(StoredCover::empty()),
            CoverSource::UploadedBytes(file) => self.store_uploaded(file).await,
            CoverSource::RemoteUrl(url) => self.fetch_and_store(&url).await,
        }
    }

    async fn store_uploaded(&self, file: UploadedCover) -> Result<StoredCover, PipelineError> {
        let size = file.content.len() as u64;
        let url = self
            .store
            .store_bytes(
                file.content,
                &file.content_type,
                Some(size),
                Some(&file.original_name),
            )
            .await?;

        info!(%url, "stored uploaded cover");
        Ok(StoredCover::new(url))
    }

    async fn fetch_and_store(&self, remote_url: &str) -> Result<StoredCover, PipelineError> {
        let response = self
            .http
            .get(remote_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                warn!(url = remote_url, error = %e, "cover fetch failed");
                PipelineError::TransferFailed(format!("fetch failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(url = remote_url, %status, "cover fetch returned non-success");
            return Err(PipelineError::TransferFailed(format!(
                "fetch returned status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::TransferFailed(format!("failed to read body: {e}")))?;

        if bytes.is_empty() {
            return Err(PipelineError::TransferFailed(
                "fetch returned empty body".to_string(),
            ));
        }

        let size = bytes.len() as u64;
        let url = self
            .store
            .store_bytes(bytes.to_vec(), REMOTE_CONTENT_TYPE, Some(size), None)
            .await?;

        info!(source = remote_url, %url, "stored remote cover");
        Ok(StoredCover::new(url))
    }
}
