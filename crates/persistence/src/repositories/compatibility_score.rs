//! Compatibility score cache repository.

use async_trait::async_trait;
use domain::models::{CompatibilityScore, UserPair};
use domain::store::ScoreCache;
use domain::StoreError;
use sqlx::PgPool;

use crate::entities::CompatibilityScoreEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for cached compatibility scores.
#[derive(Clone)]
pub struct CompatibilityScoreRepository {
    pool: PgPool,
}

impl CompatibilityScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreCache for CompatibilityScoreRepository {
    /// Last write wins.
    async fn upsert_score(&self, score: &CompatibilityScore) -> Result<(), StoreError> {
        let timer = QueryTimer::new("upsert_compatibility_score");
        let degraded: Vec<String> = score.degraded.iter().map(|d| d.as_str().to_string()).collect();
        let result = sqlx::query(
            r#"
            INSERT INTO compatibility_scores (
                user_low, user_high, interests, prompts, engagement, diversity,
                behavioral, model_prediction, total, degraded, computed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_low, user_high) DO UPDATE SET
                interests = EXCLUDED.interests,
                prompts = EXCLUDED.prompts,
                engagement = EXCLUDED.engagement,
                diversity = EXCLUDED.diversity,
                behavioral = EXCLUDED.behavioral,
                model_prediction = EXCLUDED.model_prediction,
                total = EXCLUDED.total,
                degraded = EXCLUDED.degraded,
                computed_at = EXCLUDED.computed_at
            "#,
        )
        .bind(score.pair.low())
        .bind(score.pair.high())
        .bind(score.sub_scores.interests)
        .bind(score.sub_scores.prompts)
        .bind(score.sub_scores.engagement)
        .bind(score.sub_scores.diversity)
        .bind(score.sub_scores.behavioral)
        .bind(score.sub_scores.model_prediction)
        .bind(score.total)
        .bind(&degraded)
        .bind(score.computed_at)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(store_error)
    }

    async fn find_score(&self, pair: UserPair) -> Result<Option<CompatibilityScore>, StoreError> {
        let timer = QueryTimer::new("find_compatibility_score");
        let row = sqlx::query_as::<_, CompatibilityScoreEntity>(
            r#"
            SELECT user_low, user_high, interests, prompts, engagement, diversity,
                   behavioral, model_prediction, total, degraded, computed_at
            FROM compatibility_scores
            WHERE user_low = $1 AND user_high = $2
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        row.map_err(store_error)?.map(TryInto::try_into).transpose()
    }
}
