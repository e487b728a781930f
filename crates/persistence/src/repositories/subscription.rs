//! Subscription tier lookups.

use async_trait::async_trait;
use domain::models::SubscriptionTier;
use domain::store::TierDirectory;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SubscriptionEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Read-only repository over user_subscriptions.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierDirectory for SubscriptionRepository {
    async fn tier_for(&self, user_id: Uuid) -> Result<SubscriptionTier, StoreError> {
        let timer = QueryTimer::new("find_subscription_tier");
        let row = sqlx::query_as::<_, SubscriptionEntity>(
            r#"
            SELECT user_id, tier, updated_at
            FROM user_subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(row
            .map_err(store_error)?
            .map(|entity| entity.tier())
            .unwrap_or_default())
    }
}
