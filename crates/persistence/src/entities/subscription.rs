//! User subscription entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::SubscriptionTier;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the user_subscriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionEntity {
    pub user_id: Uuid,
    pub tier: String,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionEntity {
    /// Parsed tier; unknown labels fall back to free.
    pub fn tier(&self) -> SubscriptionTier {
        SubscriptionTier::parse(&self.tier).unwrap_or_else(|| {
            tracing::warn!(user_id = %self.user_id, tier = %self.tier, "Unknown subscription tier");
            SubscriptionTier::Free
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        let mut entity = SubscriptionEntity {
            user_id: Uuid::new_v4(),
            tier: "premium".to_string(),
            updated_at: Utc::now(),
        };
        assert_eq!(entity.tier(), SubscriptionTier::Premium);
        entity.tier = "platinum".to_string();
        assert_eq!(entity.tier(), SubscriptionTier::Free);
    }
}
