use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const IMAGE_GENERATION_URL: &str = "https://api.openai.com/v1/images/generations";
const USER_AGENT: &str = "Bookpost/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const IMAGE_COUNT: u8 = 1;
const IMAGE_SIZE: &str = "512x512";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("image generation upstream failure: {0}")]
    UpstreamFailure(String),
}

/// Client for the external text-to-image API.
///
/// Holds the endpoint URL and the process-wide default API key, both set at
/// startup and never mutated. The URL a call returns is temporary — the
/// provider expires it — so it must be persisted through the object store
/// before being handed to anything durable.
#[derive(Clone)]
pub struct CoverGenerator {
    client: reqwest::Client,
    url: String,
    default_api_key: String,
}

impl CoverGenerator {
    pub fn new(client: reqwest::Client, url: String, default_api_key: String) -> Self {
        Self {
            client,
            url,
            default_api_key,
        }
    }

    /// Request one generated image for `prompt` and return the provider's
    /// temporary URL for it.
    ///
    /// A non-blank `user_api_key` takes precedence over the default key
    /// configured at startup. Single-attempt: transport failures, non-2xx
    /// responses, and empty result lists all surface as `UpstreamFailure`.
    pub async fn generate(
        &self,
        prompt: &str,
        user_api_key: Option<&str>,
    ) -> Result<String, GenerationError> {
        let key = match user_api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => &self.default_api_key,
        };

        let request_body = GenerationRequest {
            prompt: prompt.to_string(),
            n: IMAGE_COUNT,
            size: IMAGE_SIZE.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bearer {key}"))
            .timeout(REQUEST_TIMEOUT)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| GenerationError::UpstreamFailure(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(unreadable body)".to_string());
            return Err(GenerationError::UpstreamFailure(format!(
                "upstream returned status {status}: {body}"
            )));
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::UpstreamFailure(format!("malformed response: {e}")))?;

        body.data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| {
                GenerationError::UpstreamFailure("upstream returned no images".to_string())
            })
    }
}

// --- Upstream API types ---

#[derive(Debug, Serialize)]
struct GenerationRequest {
    prompt: String,
    n: u8,
    size: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}
