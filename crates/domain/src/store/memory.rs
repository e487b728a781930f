//! In-process store implementing every store contract.
//!
//! All state sits behind one async mutex, so each trait call is atomic. This
//! gives the same serialization guarantees as the database transactions.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AllocationStore, AppliedPop, ExposureStore, MatchStore, PopCommand, PopStore, ScoreCache,
    TierDirectory,
};
use crate::errors::{MatchingError, StoreError};
use crate::models::{
    AllocationWindow, CompatibilityScore, ExposureBucket, ExposureHistory, Match, MatchInsert,
    PopRecord, SubscriptionTier, UserPair,
};
use crate::services::pop::plan_transition;

#[derive(Debug, Clone)]
struct ExposureRow {
    viewer_id: Uuid,
    bucket: ExposureBucket,
    shown_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    scores: HashMap<UserPair, CompatibilityScore>,
    windows: HashMap<(Uuid, NaiveDate), AllocationWindow>,
    pops: HashMap<(Uuid, Uuid), PopRecord>,
    matches: HashMap<UserPair, Match>,
    exposures: Vec<ExposureRow>,
    tiers: HashMap<Uuid, SubscriptionTier>,
}

impl MemoryState {
    fn window_mut(&mut self, user_id: Uuid, day: NaiveDate, max: u32) -> &mut AllocationWindow {
        self.windows
            .entry((user_id, day))
            .or_insert_with(|| AllocationWindow::new(user_id, day, max))
    }
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a subscription tier to a user.
    pub async fn set_tier(&self, user_id: Uuid, tier: SubscriptionTier) {
        self.state.lock().await.tiers.insert(user_id, tier);
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of match rows; used to assert uniqueness.
    pub async fn match_count(&self) -> usize {
        self.state.lock().await.matches.len()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreCache for InMemoryStore {
    async fn upsert_score(&self, score: &CompatibilityScore) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.state
            .lock()
            .await
            .scores
            .insert(score.pair, score.clone());
        Ok(())
    }

    async fn find_score(&self, pair: UserPair) -> Result<Option<CompatibilityScore>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.lock().await.scores.get(&pair).cloned())
    }
}

#[async_trait]
impl AllocationStore for InMemoryStore {
    async fn get_or_create_window(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<AllocationWindow, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        Ok(*state.window_mut(user_id, day, max))
    }

    async fn try_increment(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        max: u32,
    ) -> Result<Option<AllocationWindow>, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        let window = state.window_mut(user_id, day, max);
        if window.is_exhausted() {
            return Ok(None);
        }
        window.used += 1;
        Ok(Some(*window))
    }
}

#[async_trait]
impl PopStore for InMemoryStore {
    async fn find_pop(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<Option<PopRecord>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .state
            .lock()
            .await
            .pops
            .get(&(actor_id, target_id))
            .cloned())
    }

    async fn interaction_partners(&self, user_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        Ok(state
            .pops
            .keys()
            .filter_map(|(actor, target)| {
                if *actor == user_id {
                    Some(*target)
                } else if *target == user_id {
                    Some(*actor)
                } else {
                    None
                }
            })
            .collect())
    }

    async fn apply_pop(&self, command: &PopCommand) -> Result<AppliedPop, MatchingError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;

        let window = *state.window_mut(command.actor_id, command.day, command.max_allocation);
        if window.is_exhausted() {
            return Err(MatchingError::AllocationExceeded {
                used: window.used,
                max: window.max,
            });
        }

        let key = (command.actor_id, command.target_id);
        let existing = state.pops.get(&key).cloned();
        let transition = plan_transition(existing.as_ref(), command.requested)?;
        let record = transition.apply(existing, command.actor_id, command.target_id, command.at);
        state.pops.insert(key, record.clone());

        let window = state.window_mut(command.actor_id, command.day, command.max_allocation);
        window.used += 1;

        Ok(AppliedPop {
            record,
            transition,
            window: *window,
        })
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn insert_match(
        &self,
        pair: UserPair,
        at: DateTime<Utc>,
    ) -> Result<MatchInsert, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        if state.matches.contains_key(&pair) {
            return Ok(MatchInsert::AlreadyExists);
        }
        let created = Match {
            id: Uuid::new_v4(),
            pair,
            created_at: at,
        };
        state.matches.insert(pair, created.clone());
        Ok(MatchInsert::Created(created))
    }

    async fn find_match(&self, pair: UserPair) -> Result<Option<Match>, StoreError> {
        self.ensure_available()?;
        Ok(self.state.lock().await.matches.get(&pair).cloned())
    }
}

#[async_trait]
impl ExposureStore for InMemoryStore {
    async fn exposure_history(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<ExposureHistory, StoreError> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        let mut history = ExposureHistory::new();
        for row in state
            .exposures
            .iter()
            .filter(|row| row.viewer_id == viewer_id && row.shown_at >= since)
        {
            history.record(row.bucket.clone());
        }
        Ok(history)
    }

    async fn record_exposures(
        &self,
        viewer_id: Uuid,
        shown: &[(Uuid, ExposureBucket)],
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        state
            .exposures
            .extend(shown.iter().map(|(_, bucket)| ExposureRow {
                viewer_id,
                bucket: bucket.clone(),
                shown_at: at,
            }));
        Ok(())
    }
}

#[async_trait]
impl TierDirectory for InMemoryStore {
    async fn tier_for(&self, user_id: Uuid) -> Result<SubscriptionTier, StoreError> {
        self.ensure_available()?;
        Ok(self
            .state
            .lock()
            .await
            .tiers
            .get(&user_id)
            .copied()
            .unwrap_or_default())
    }
}
