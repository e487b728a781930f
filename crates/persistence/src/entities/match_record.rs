//! Match entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Match, UserPair};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the matches table.
#[derive(Debug, Clone, FromRow)]
pub struct MatchEntity {
    pub id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MatchEntity> for Match {
    type Error = StoreError;

    fn try_from(entity: MatchEntity) -> Result<Self, Self::Error> {
        let pair = UserPair::new(entity.user_low, entity.user_high)
            .ok_or_else(|| StoreError::Backend(format!("self-pair match row {}", entity.id)))?;
        Ok(Self {
            id: entity.id,
            pair,
            created_at: entity.created_at,
        })
    }
}
