//! Model prediction input and predictor capability.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::DependencyError;

/// Number of features sent to the predictor.
pub const FEATURE_COUNT: usize = 15;

/// Fixed-length predictor input.
///
/// Order: age delta, pair distance, interest / prompt / engagement /
/// diversity / behavioral sub-scores in [0, 1], completion A, completion B,
/// activity A, activity B, premium A, premium B, verified A, verified B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Opaque model returning a match probability in [0, 1].
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, features: &FeatureVector) -> Result<f64, DependencyError>;
}

/// Predictor used when no model is configured; always answers the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutralPredictor(pub f64);

impl Default for NeutralPredictor {
    fn default() -> Self {
        Self(0.5)
    }
}

#[async_trait]
impl Predictor for NeutralPredictor {
    async fn predict(&self, _features: &FeatureVector) -> Result<f64, DependencyError> {
        Ok(self.0)
    }
}

/// Accept a predictor answer only when it is a probability.
pub fn checked_probability(value: f64) -> Result<f64, DependencyError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DependencyError::InvalidResponse(format!(
            "prediction {value} outside [0, 1]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_probability() {
        assert_eq!(checked_probability(0.7).unwrap(), 0.7);
        assert!(checked_probability(1.2).is_err());
        assert!(checked_probability(-0.1).is_err());
        assert!(checked_probability(f64::NAN).is_err());
    }

    #[test]
    fn test_feature_vector_serializes_as_array() {
        let json = serde_json::to_string(&FeatureVector([0.0; FEATURE_COUNT])).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(json.matches(',').count(), FEATURE_COUNT - 1);
    }

    #[tokio::test]
    async fn test_neutral_predictor_answers_constant() {
        let value = NeutralPredictor::default()
            .predict(&FeatureVector([1.0; FEATURE_COUNT]))
            .await
            .unwrap();
        assert_eq!(value, 0.5);
    }
}
