//! Compatibility score domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical key of an unordered user pair (`low < high`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPair {
    low: Uuid,
    high: Uuid,
}

impl UserPair {
    /// Build the canonical key; returns `None` for a self-pair.
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }
}

/// A scoring input that fell back to its degraded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedSignal {
    /// Embeddings unavailable; prompt similarity used string similarity.
    PromptEmbedding,
    /// Predictor unavailable; neutral prediction used.
    ModelPrediction,
    /// The whole scoring task failed; fallback total used.
    Scoring,
}

impl DegradedSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedSignal::PromptEmbedding => "prompt_embedding",
            DegradedSignal::ModelPrediction => "model_prediction",
            DegradedSignal::Scoring => "scoring",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prompt_embedding" => Some(DegradedSignal::PromptEmbedding),
            "model_prediction" => Some(DegradedSignal::ModelPrediction),
            "scoring" => Some(DegradedSignal::Scoring),
            _ => None,
        }
    }
}

impl std::fmt::Display for DegradedSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sub-signal scores, each in [0, 100] except `model_prediction` in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub interests: f64,
    pub prompts: f64,
    pub engagement: f64,
    pub diversity: f64,
    pub behavioral: f64,
    pub model_prediction: f64,
}

/// Cached compatibility result for an unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityScore {
    pub pair: UserPair,
    pub sub_scores: SubScores,
    /// Weighted total in [0, 100].
    pub total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<DegradedSignal>,
    pub computed_at: DateTime<Utc>,
}

impl CompatibilityScore {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}
