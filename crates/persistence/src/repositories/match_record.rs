//! Match repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Match, MatchInsert, UserPair};
use domain::store::MatchStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MatchEntity;
use crate::error::store_error;
use crate::metrics::QueryTimer;

/// Repository for mutual matches.
#[derive(Clone)]
pub struct MatchRepository {
    pool: PgPool,
}

impl MatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for MatchRepository {
    /// The pair's unique constraint decides which concurrent caller creates the match.
    async fn insert_match(
        &self,
        pair: UserPair,
        at: DateTime<Utc>,
    ) -> Result<MatchInsert, StoreError> {
        let timer = QueryTimer::new("insert_match");
        let row = sqlx::query_as::<_, MatchEntity>(
            r#"
            INSERT INTO matches (id, user_low, user_high, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_low, user_high) DO NOTHING
            RETURNING id, user_low, user_high, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pair.low())
        .bind(pair.high())
        .bind(at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match row.map_err(store_error)? {
            Some(entity) => Ok(MatchInsert::Created(entity.try_into()?)),
            None => Ok(MatchInsert::AlreadyExists),
        }
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        let timer = QueryTimer::new("find_match");
        let row = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT id, user_low, user_high, created_at
            FROM matches
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
