//! HTTP embedding client.

use async_trait::async_trait;
use domain::services::EmbeddingProvider;
use domain::DependencyError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::transport_error;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Posts `{inputs: [..]}` and expects one vector per input in `{embeddings}`.
pub struct HttpEmbeddingProvider {
    client: Client,
    url: String,
    timeout_ms: u64,
}

impl HttpEmbeddingProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DependencyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DependencyError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, DependencyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { inputs })
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DependencyError::Unavailable(format!(
                "embedding service returned HTTP {status}"
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DependencyError::InvalidResponse(e.to_string()))?;

        if body.embeddings.len() != inputs.len() {
            return Err(DependencyError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                body.embeddings.len()
            )));
        }
        Ok(body.embeddings)
    }
}
