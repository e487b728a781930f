//! Store contracts used by the matching services.
//!
//! Each trait is a read/write contract against a transactional store. The
//! persistence crate implements them on PostgreSQL; [`memory::InMemoryStore`]
//! implements them in process for tests and local runs.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::{MatchingError, StoreError};
use crate::models::{
    AllocationWindow, CompatibilityScore, ExposureBucket, ExposureHistory, Match, MatchInsert,
    PopRecord, PopType, SubscriptionTier, UserPair,
};
use crate::services::pop::Transition;

pub use memory::InMemoryStore;

/// Cache of compatibility scores keyed by unordered pair. Writes are last-write-wins.
#[async_trait]
pub trait ScoreCache: Send + Sync {
    async fn upsert_score(&self, score: &CompatibilityScore) -> Result<(), StoreError>;

    async fn find_score(&self, pair: UserPair) -> Result<Option<CompatibilityScore>, StoreError>;
}

/// Per-user, per-day allocation counters.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Return the window for `(user_id, day)`, creating it with `max` if absent.
    async fn get_or_create_window(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<AllocationWindow, StoreError>;

    /// Atomically increment `used` when `used < max`.
    ///
    /// Returns `None` when the window is exhausted. Pop charges happen in
    /// [`PopStore::apply_pop`] against the same window and the same bound.
    async fn try_increment(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<Option<AllocationWindow>, StoreError>;
}

/// Input of one atomic pop transition.
#[derive(Debug, Clone, PartialEq)]
pub struct PopCommand {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub requested: PopType,
    /// Allocation day the pop is charged to.
    pub day: NaiveDate,
    /// Tier maximum used if the window does not exist yet.
    pub max_allocation: u32,
    pub at: DateTime<Utc>,
}

/// Result of a committed pop transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPop {
    pub record: PopRecord,
    pub transition: Transition,
    pub window: AllocationWindow,
}

#[async_trait]
pub trait PopStore: Send + Sync {
    async fn find_pop(&self, actor_id: Uuid, target_id: Uuid)
        -> Result<Option<PopRecord>, StoreError>;

    /// Users that `user_id` popped or was popped by.
    async fn interaction_partners(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError>;

    /// Apply one pop atomically.
    ///
    /// In a single unit of work: load (or lazily create) the actor's allocation
    /// window and fail with `AllocationExceeded` when exhausted, plan the
    /// transition against the current record, write the record, and charge one
    /// allocation unit. Nothing is written on any error. A lost race on the
    /// record surfaces as `ConcurrencyConflict`.
    async fn apply_pop(&self, command: &PopCommand) -> Result<AppliedPop, MatchingError>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert the match for `pair` unless one already exists.
    async fn insert_match(
        &self,
        pair: UserPair,
        at: DateTime<Utc>,
    ) -> Result<MatchInsert, StoreError>;

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError>;
}

/// Append-only log of candidates shown to viewers.
#[async_trait]
pub trait ExposureStore: Send + Sync {
    /// Exposure counts per bucket for `viewer_id` since `since`.
    async fn exposure_history(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<ExposureHistory, StoreError>;

    async fn record_exposures(
        &self,
        viewer_id: Uuid,
        shown: &[(Uuid, ExposureBucket)],
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Read contract for subscription tiers; billing lives elsewhere.
#[async_trait]
pub trait TierDirectory: Send + Sync {
    /// Tier of `user_id`; users without a subscription are on the free tier.
    async fn tier_for(&self, user_id: Uuid) -> Result<SubscriptionTier, StoreError>;
}
