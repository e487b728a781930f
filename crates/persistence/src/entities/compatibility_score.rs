//! Compatibility score entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{CompatibilityScore, DegradedSignal, SubScores, UserPair};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the compatibility_scores table.
#[derive(Debug, Clone, FromRow)]
pub struct CompatibilityScoreEntity {
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub interests: f64,
    pub prompts: f64,
    pub engagement: f64,
    pub diversity: f64,
    pub behavioral: f64,
    pub model_prediction: f64,
    pub total: f64,
    pub degraded: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

impl TryFrom<CompatibilityScoreEntity> for CompatibilityScore {
    type Error = StoreError;

    fn try_from(entity: CompatibilityScoreEntity) -> Result<Self, Self::Error> {
        let pair = UserPair::new(entity.user_low, entity.user_high).ok_or_else(|| {
            StoreError::Backend(format!("self-pair score row for {}", entity.user_low))
        })?;
        Ok(Self {
            pair,
            sub_scores: SubScores {
                interests: entity.interests,
                prompts: entity.prompts,
                engagement: entity.engagement,
                diversity: entity.diversity,
                behavioral: entity.behavioral,
                model_prediction: entity.model_prediction,
            },
            total: entity.total,
            // Unknown labels come from newer writers; drop them.
            degraded: entity
                .degraded
                .iter()
                .filter_map(|s| DegradedSignal::parse(s))
                .collect(),
            computed_at: entity.computed_at,
        })
    }
}
