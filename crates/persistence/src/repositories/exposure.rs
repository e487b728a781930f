//! Exposure log repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{ExposureBucket, ExposureHistory};
use domain::store::ExposureStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ExposureCountEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for the append-only exposure log.
#[derive(Clone)]
pub struct ExposureRepository {
    pool: PgPool,
}

impl ExposureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete events older than `before`. Returns the number of rows removed.
    pub async fn prune_before(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("prune_exposure_events");
        let result = sqlx::query("DELETE FROM exposure_events WHERE shown_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await;
        timer.record();

        Ok(result.map_err(store_error)?.rows_affected())
    }
}

#[async_trait]
impl ExposureStore for ExposureRepository {
    async fn exposure_history(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<ExposureHistory, StoreError> {
        let timer = QueryTimer::new("exposure_history");
        let rows = sqlx::query_as::<_, ExposureCountEntity>(
            r#"
            SELECT age_bracket, category, COUNT(*) AS exposures
            FROM exposure_events
            WHERE viewer_id = $1 AND shown_at >= $2
            GROUP BY age_bracket, category
            "#,
        )
        .bind(viewer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let mut history = ExposureHistory::new();
        for (bucket, count) in rows
            .map_err(store_error)?
            .into_iter()
            .filter_map(ExposureCountEntity::into_bucket)
        {
            history.add(bucket, count);
        }
        Ok(history)
    }

    async fn record_exposures(
        &self,
        viewer_id: Uuid,
        shown: &[(Uuid, ExposureBucket)],
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if shown.is_empty() {
            return Ok(());
        }

        let candidate_ids: Vec<Uuid> = shown.iter().map(|(id, _)| *id).collect();
        let brackets: Vec<String> = shown
            .iter()
            .map(|(_, b)| b.age_bracket.as_str().to_string())
            .collect();
        let categories: Vec<String> = shown.iter().map(|(_, b)| b.category.clone()).collect();

        let timer = QueryTimer::new("record_exposures");
        let result = sqlx::query(
            r#"
            INSERT INTO exposure_events (viewer_id, candidate_id, age_bracket, category, shown_at)
            SELECT $1, candidate_id, age_bracket, category, $5
            FROM UNNEST($2::uuid[], $3::text[], $4::text[])
                AS shown(candidate_id, age_bracket, category)
            "#,
        )
        .bind(viewer_id)
        .bind(&candidate_ids)
        .bind(&brackets)
        .bind(&categories)
        .bind(at)
        .execute(&self.pool)
        .await;
        timer.record();

        result.map(|_| ()).map_err(store_error)
    }
}
