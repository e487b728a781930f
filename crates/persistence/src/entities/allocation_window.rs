//! Allocation window entity (database row mapping).

use chrono::NaiveDate;
use domain::models::AllocationWindow;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the allocation_windows table.
#[derive(Debug, Clone, FromRow)]
pub struct AllocationWindowEntity {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub used: i32,
    pub max_pops: i32,
}

impl From<AllocationWindowEntity> for AllocationWindow {
    fn from(entity: AllocationWindowEntity) -> Self {
        Self {
            user_id: entity.user_id,
            day: entity.day,
            used: entity.used.max(0) as u32,
            max: entity.max_pops.max(0) as u32,
        }
    }
}
