//! HTTP predictor client.

use async_trait::async_trait;
use domain::services::scoring::prediction::checked_probability;
use domain::services::scoring::FeatureVector;
use domain::services::Predictor;
use domain::DependencyError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::transport_error;

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a FeatureVector,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    probability: f64,
}

/// Posts `{features: [f64; 15]}` to the model service and expects
/// `{probability}` back.
pub struct HttpPredictor {
    client: Client,
    url: String,
    timeout_ms: u64,
}

impl HttpPredictor {
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
impl Predictor for HttpPredictor {
    async fn predict(&self, features: &FeatureVector) -> Result<f64, DependencyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PredictRequest { features })
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DependencyError::Unavailable(format!("predictor returned HTTP {status}")));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| DependencyError::InvalidResponse(e.to_string()))?;

        debug!(probability = body.probability, "Prediction received");
        checked_probability(body.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::scoring::FEATURE_COUNT;

    #[test]
    fn test_request_wire_format() {
        let features = FeatureVector([0.5; FEATURE_COUNT]);
        let json = serde_json::to_value(PredictRequest { features: &features }).unwrap();
        assert_eq!(json["features"].as_array().unwrap().len(), FEATURE_COUNT);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let predictor = HttpPredictor::new("http://127.0.0.1:9/predict", Duration::from_millis(200))
            .unwrap();
        let err = predictor
            .predict(&FeatureVector([0.0; FEATURE_COUNT]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DependencyError::Unavailable(_) | DependencyError::Timeout(_)
        ));
    }
}
