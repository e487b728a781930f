//! Pop record entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{PopRecord, PopType};
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the pop_records table.
#[derive(Debug, Clone, FromRow)]
pub struct PopRecordEntity {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub state: String,
    pub revealed: bool,
    pub pop_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PopRecordEntity> for PopRecord {
    type Error = StoreError;

    fn try_from(entity: PopRecordEntity) -> Result<Self, Self::Error> {
        let state = PopType::parse(&entity.state)
            .ok_or_else(|| StoreError::Backend(format!("unknown pop state '{}'", entity.state)))?;
        Ok(Self {
            actor_id: entity.actor_id,
            target_id: entity.target_id,
            state,
            revealed: entity.revealed,
            pop_count: entity.pop_count.max(0) as u32,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
