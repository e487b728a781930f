//! Daily pop allocation tracker.
//!
//! Windows are keyed by UTC calendar day and created lazily with the
//! tier-dependent maximum. Unused pops do not carry over and `used` never
//! decrements, so no reset job exists.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::AllocationLimits;
use crate::errors::MatchingError;
use crate::models::AllocationWindow;
use crate::store::{AllocationStore, TierDirectory};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Current allocation day (UTC).
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    at: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at: Mutex::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.at.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.at.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Per-user, per-day pop quota gate.
pub struct AllocationTracker {
    store: Arc<dyn AllocationStore>,
    tiers: Arc<dyn TierDirectory>,
    limits: AllocationLimits,
    clock: Arc<dyn Clock>,
}

impl AllocationTracker {
    pub fn new(
        store: Arc<dyn AllocationStore>,
        tiers: Arc<dyn TierDirectory>,
        limits: AllocationLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            tiers,
            limits,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Daily maximum for the user's current tier.
    pub async fn max_for(&self, user_id: Uuid) -> Result<u32, MatchingError> {
        let tier = self.tiers.tier_for(user_id).await?;
        Ok(self.limits.max_for(tier))
    }

    /// Current usage for `(user_id, day)`; creates the window if absent.
    pub async fn check_allocation(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<AllocationWindow, MatchingError> {
        let max = self.max_for(user_id).await?;
        Ok(self.store.get_or_create_window(user_id, day, max).await?)
    }

    /// Charge one unit to `(user_id, day)` outside a pop.
    ///
    /// Pops never call this: [`PopStore::apply_pop`](crate::store::PopStore::apply_pop)
    /// charges the same window inside the pop's own atomic step, so the quota
    /// check, the record write and the charge commit or fail together. Both
    /// paths stop at `used == max` on the same window.
    pub async fn increment_allocation(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> Result<AllocationWindow, MatchingError> {
        let max = self.max_for(user_id).await?;
        match self.store.try_increment(user_id, day, max).await? {
            Some(window) => Ok(window),
            None => {
                let window = self.store.get_or_create_window(user_id, day, max).await?;
                tracing::debug!(
                    user_id = %user_id,
                    day = %day,
                    used = window.used,
                    max = window.max,
                    "Allocation exhausted"
                );
                Err(MatchingError::AllocationExceeded {
                    used: window.used,
                    max: window.max,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubscriptionTier;
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    fn tracker(store: Arc<InMemoryStore>, clock: Arc<FixedClock>) -> AllocationTracker {
        AllocationTracker::new(store.clone(), store, AllocationLimits::default(), clock)
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_check_allocation_uses_tier_max() {
        let store = Arc::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        store.set_tier(user, SubscriptionTier::Plus).await;
        let tracker = tracker(store, clock());

        let window = tracker.check_allocation(user, tracker.today()).await.unwrap();
        assert_eq!(window.used, 0);
        assert_eq!(window.max, 25);
    }

    #[tokio::test]
    async fn test_increment_until_exhausted() {
        let store = Arc::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let tracker = tracker(store, clock());
        let day = tracker.today();

        for _ in 0..10 {
            tracker.increment_allocation(user, day).await.unwrap();
        }
        let err = tracker.increment_allocation(user, day).await.unwrap_err();
        assert_eq!(err, MatchingError::AllocationExceeded { used: 10, max: 10 });
    }

    #[tokio::test]
    async fn test_midnight_starts_new_window() {
        let store = Arc::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let clock = clock();
        let tracker = tracker(store, clock.clone());

        tracker.increment_allocation(user, tracker.today()).await.unwrap();
        clock.advance(chrono::Duration::hours(1));
        assert_eq!(tracker.today(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());

        let window = tracker.check_allocation(user, tracker.today()).await.unwrap();
        assert_eq!(window.used, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_respect_max() {
        let store = Arc::new(InMemoryStore::new());
        let user = Uuid::new_v4();
        let tracker = Arc::new(tracker(store, clock()));
        let day = tracker.today();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker.increment_allocation(user, day).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 10);
        let window = tracker.check_allocation(user, day).await.unwrap();
        assert_eq!(window.used, 10);
    }
}
