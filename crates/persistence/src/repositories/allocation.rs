//! Allocation window repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::models::AllocationWindow;
use domain::store::AllocationStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::AllocationWindowEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Lazily creates the window for `($1, $2)` with maximum `$3`; an existing
/// window keeps the maximum it was created with.
pub(crate) const ENSURE_WINDOW_SQL: &str = r#"
    INSERT INTO allocation_windows (user_id, day, used, max_pops)
    VALUES ($1, $2, 0, $3)
    ON CONFLICT (user_id, day) DO NOTHING
"#;

/// Conditional increment; returns no row when the window is exhausted.
pub(crate) const INCREMENT_WINDOW_SQL: &str = r#"
    UPDATE allocation_windows
    SET used = used + 1
    WHERE user_id = $1 AND day = $2 AND used < max_pops
    RETURNING user_id, day, used, max_pops
"#;

/// Repository for per-day pop allocation counters.
#[derive(Clone)]
pub struct AllocationRepository {
    pool: PgPool,
}

impl AllocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_window(&self, user_id: Uuid, day: NaiveDate, max: u32) -> Result<(), StoreError> {
        sqlx::query(ENSURE_WINDOW_SQL)
            .bind(user_id)
            .bind(day)
            .bind(max as i32)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}

#[async_trait]
impl AllocationStore for AllocationRepository {
    async fn get_or_create_window(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<AllocationWindow, StoreError> {
        let timer = QueryTimer::new("get_or_create_allocation_window");
        self.ensure_window(user_id, day, max).await?;
        let row = sqlx::query_as::<_, AllocationWindowEntity>(
            r#"
            SELECT user_id, day, used, max_pops
            FROM allocation_windows
            WHERE user_id = $1 AND day = $2
            "#,
        )
        .bind(user_id)
        .bind(day)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        Ok(row.map_err(store_error)?.into())
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<Option<AllocationWindow>, StoreError> {
        let timer = QueryTimer::new("increment_allocation_window");
        self.ensure_window(user_id, day, max).await?;
        let row = sqlx::query_as::<_, AllocationWindowEntity>(INCREMENT_WINDOW_SQL)
            .bind(user_id)
            .bind(day)
            .fetch_optional(&self.pool)
            .await;
        timer.record();

        Ok(row.map_err(store_error)?.map(Into::into))
    }
}
