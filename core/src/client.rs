use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AssistantConfig;
use crate::errors::{GenerationError, GenerationResult};
use crate::types::*;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Transport to the external generation capability.
///
/// Every call receives the credential explicitly; implementations keep no
/// per-user state.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(
        &self,
        credential: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GenerationResult<GenerateContentResponse>;

    /// Starts a long-running video job and returns its handle
    async fn submit_video(
        &self,
        credential: &str,
        model: &str,
        request: &VideoRequest,
    ) -> GenerationResult<Operation>;

    /// Fetches the current state of a long-running job
    async fn poll_operation(&self, credential: &str, name: &str) -> GenerationResult<Operation>;
}

/// Transport error with the request URL stripped
fn transport(context: &str, err: reqwest::Error) -> GenerationError {
    GenerationError::Transport(format!("{}: {}", context, err.without_url()))
}

/// REST backend for the Gemini API.
///
/// The credential travels in the `x-goog-api-key` header, never in the URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &AssistantConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GenerationError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.trim_start_matches('/'))
    }

    /// Maps non-success statuses to `CapabilityRejected` and decodes the body
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> GenerationResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport("Failed to read response", e))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => format!(
                    "{} (code: {}, status: {})",
                    envelope.error.message, envelope.error.code, envelope.error.status
                ),
                Err(_) => body,
            };
            warn!(status = status.as_u16(), "Generation API rejected request");
            return Err(GenerationError::CapabilityRejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| GenerationError::Parsing(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate_content(
        &self,
        credential: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GenerationResult<GenerateContentResponse> {
        debug!(model = model, "Sending generateContent request");

        let response = self
            .client
            .post(self.model_url(model, "generateContent"))
            .header(API_KEY_HEADER, credential)
            .json(request)
            .send()
            .await
            .map_err(|e| transport("Failed to send request", e))?;

        Self::decode(response).await
    }

    async fn submit_video(
        &self,
        credential: &str,
        model: &str,
        request: &VideoRequest,
    ) -> GenerationResult<Operation> {
        debug!(model = model, "Submitting video generation job");

        let response = self
            .client
            .post(self.model_url(model, "predictLongRunning"))
            .header(API_KEY_HEADER, credential)
            .json(request)
            .send()
            .await
            .map_err(|e| transport("Failed to submit job", e))?;

        Self::decode(response).await
    }

    async fn poll_operation(&self, credential: &str, name: &str) -> GenerationResult<Operation> {
        let response = self
            .client
            .get(self.operation_url(name))
            .header(API_KEY_HEADER, credential)
            .send()
            .await
            .map_err(|e| transport("Failed to poll job", e))?;

        Self::decode(response).await
    }
}
