//! Pop record repository.
//!
//! [`PopRepository::apply_pop`] runs the whole transition in one transaction:
//! the allocation window row and the pop record row are locked with
//! `SELECT ... FOR UPDATE`, so concurrent pops by the same actor serialize on
//! the window and no two writers can both see a SINGLE and upgrade it.

use async_trait::async_trait;
use domain::models::{AllocationWindow, PopRecord};
use domain::services::{plan_transition, Transition};
use domain::store::{AppliedPop, PopCommand, PopStore};
use domain::{MatchingError, StoreError};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::entities::{AllocationWindowEntity, PopRecordEntity};
use crate::error::{matching_error, store_error};
use crate::metrics::QueryTimer;
use crate::repositories::allocation::{ENSURE_WINDOW_SQL, INCREMENT_WINDOW_SQL};

/// Repository for directed pop records.
#[derive(Clone)]
pub struct PopRepository {
    pool: PgPool,
}

impl PopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn apply_in_transaction(&self, command: &PopCommand) -> Result<AppliedPop, MatchingError> {
        let mut tx = self.pool.begin().await.map_err(matching_error)?;

        sqlx::query(ENSURE_WINDOW_SQL)
            .bind(command.actor_id)
            .bind(command.day)
            .bind(command.max_allocation as i32)
            .execute(&mut *tx)
            .await
            .map_err(matching_error)?;

        let window: AllocationWindow = sqlx::query_as::<_, AllocationWindowEntity>(
            r#"
            SELECT user_id, day, used, max_pops
            FROM allocation_windows
            WHERE user_id = $1 AND day = $2
            FOR UPDATE
            "#,
        )
        .bind(command.actor_id)
        .bind(command.day)
        .fetch_one(&mut *tx)
        .await
        .map_err(matching_error)?
        .into();

        if window.is_exhausted() {
            return Err(MatchingError::AllocationExceeded {
                used: window.used,
                max: window.max,
            });
        }

        let existing: Option<PopRecord> = sqlx::query_as::<_, PopRecordEntity>(
            r#"
            SELECT actor_id, target_id, state, revealed, pop_count, created_at, updated_at
            FROM pop_records
            WHERE actor_id = $1 AND target_id = $2
            FOR UPDATE
            "#,
        )
        .bind(command.actor_id)
        .bind(command.target_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(matching_error)?
        .map(PopRecord::try_from)
        .transpose()?;

        let transition = plan_transition(existing.as_ref(), command.requested)?;
        let planned = transition.apply(existing, command.actor_id, command.target_id, command.at);

        let written = match transition {
            Transition::Create(_) => sqlx::query_as::<_, PopRecordEntity>(
                r#"
                INSERT INTO pop_records (actor_id, target_id, state, revealed, pop_count, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (actor_id, target_id) DO NOTHING
                RETURNING actor_id, target_id, state, revealed, pop_count, created_at, updated_at
                "#,
            )
            .bind(planned.actor_id)
            .bind(planned.target_id)
            .bind(planned.state.as_str())
            .bind(planned.revealed)
            .bind(planned.pop_count as i32)
            .bind(planned.created_at)
            .bind(planned.updated_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(matching_error)?,
            Transition::Upgrade | Transition::Repeat => sqlx::query_as::<_, PopRecordEntity>(
                r#"
                UPDATE pop_records
                SET state = $3, revealed = $4, pop_count = $5, updated_at = $6
                WHERE actor_id = $1 AND target_id = $2 AND state = 'single'
                RETURNING actor_id, target_id, state, revealed, pop_count, created_at, updated_at
                "#,
            )
            .bind(planned.actor_id)
            .bind(planned.target_id)
            .bind(planned.state.as_str())
            .bind(planned.revealed)
            .bind(planned.pop_count as i32)
            .bind(planned.updated_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(matching_error)?,
        };

        let record: PopRecord = written
            .ok_or_else(|| {
                MatchingError::ConcurrencyConflict(format!(
                    "pop record {} -> {} changed concurrently",
                    command.actor_id, command.target_id
                ))
            })?
            .try_into()?;

        let window: AllocationWindow = sqlx::query_as::<_, AllocationWindowEntity>(INCREMENT_WINDOW_SQL)
            .bind(command.actor_id)
            .bind(command.day)
            .fetch_optional(&mut *tx)
            .await
            .map_err(matching_error)?
            .ok_or(MatchingError::AllocationExceeded {
                used: window.used,
                max: window.max,
            })?
            .into();

        tx.commit().await.map_err(matching_error)?;

        Ok(AppliedPop {
            record,
            transition,
            window,
        })
    }
}

#[async_trait]
impl PopStore for PopRepository {
    async fn find_pop(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<PopRecord>, StoreError> {
        let timer = QueryTimer::new("find_pop_record");
        let row = sqlx::query_as::<_, PopRecordEntity>(
            r#"
            SELECT actor_id, target_id, state, revealed, pop_count, created_at, updated_at
            FROM pop_records
            WHERE actor_id = $1 AND target_id = $2
            "#,
        )
        .bind(actor_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        row.map_err(store_error)?.map(TryInto::try_into).transpose()
    }

    async fn interaction_partners(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        let timer = QueryTimer::new("pop_interaction_partners");
        let rows = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT target_id FROM pop_records WHERE actor_id = $1
            UNION
            SELECT actor_id FROM pop_records WHERE target_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(rows.map_err(store_error)?.into_iter().collect())
    }

    async fn apply_pop(&self, command: &PopCommand) -> Result<AppliedPop, MatchingError> {
        let timer = QueryTimer::new("apply_pop");
        let result = self.apply_in_transaction(command).await;
        timer.record();

        if let Err(e) = &result {
            tracing::debug!(
                actor_id = %command.actor_id,
                target_id = %command.target_id,
                error = %e,
                "Pop transaction rolled back"
            );
        }
        result
    }
}
