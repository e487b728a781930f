//! Pop state machine.
//!
//! Per ordered pair: `NONE -> SINGLE -> DOUBLE`, DOUBLE terminal. Whenever a
//! pair reaches DOUBLE the reverse direction is checked, and a mutual DOUBLE
//! creates exactly one match.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::MatchingError;
use crate::models::{MatchCreatedEvent, MatchInsert, PopOutcome, PopRecord, PopType, UserPair};
use crate::services::allocation::AllocationTracker;
use crate::services::events::{MatchEventSink, PublishResult};
use crate::store::{AppliedPop, MatchStore, PopCommand, PopStore};

/// Planned change to a pop record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No record yet; create one in the requested state.
    Create(PopType),
    /// SINGLE upgraded to DOUBLE.
    Upgrade,
    /// SINGLE popped again as SINGLE; state unchanged.
    Repeat,
}

impl Transition {
    pub fn resulting_state(&self) -> PopType {
        match self {
            Transition::Create(state) => *state,
            Transition::Upgrade => PopType::Double,
            Transition::Repeat => PopType::Single,
        }
    }

    /// Build the record that results from applying this transition.
    pub fn apply(
        &self,
        existing: Option<PopRecord>,
        actor_id: Uuid,
        target_id: Uuid,
        at: DateTime<Utc>,
    ) -> PopRecord {
        let state = self.resulting_state();
        match existing {
            Some(mut record) if !matches!(self, Transition::Create(_)) => {
                record.state = state;
                record.revealed = record.revealed || state == PopType::Double;
                record.pop_count += 1;
                record.updated_at = at;
                record
            }
            _ => PopRecord {
                actor_id,
                target_id,
                state,
                revealed: state == PopType::Double,
                pop_count: 1,
                created_at: at,
                updated_at: at,
            },
        }
    }
}

/// Decide the transition for a pop against the current record.
///
/// An existing DOUBLE is terminal and yields `AlreadyPopped` carrying it.
pub fn plan_transition(
    existing: Option<&PopRecord>,
    requested: PopType,
) -> Result<Transition, MatchingError> {
    match existing {
        None => Ok(Transition::Create(requested)),
        Some(record) if record.state == PopType::Double => {
            Err(MatchingError::AlreadyPopped(Box::new(record.clone())))
        }
        Some(_) => Ok(match requested {
            PopType::Double => Transition::Upgrade,
            PopType::Single => Transition::Repeat,
        }),
    }
}

/// Applies pops, charges allocation and reconciles mutual matches.
pub struct PopService {
    pops: Arc<dyn PopStore>,
    matches: Arc<dyn MatchStore>,
    allocations: Arc<AllocationTracker>,
    events: Arc<dyn MatchEventSink>,
}

impl PopService {
    pub fn new(
        pops: Arc<dyn PopStore>,
        matches: Arc<dyn MatchStore>,
        allocations: Arc<AllocationTracker>,
        events: Arc<dyn MatchEventSink>,
    ) -> Self {
        Self {
            pops,
            matches,
            allocations,
            events,
        }
    }

    /// Pop `target_id`'s balloon on behalf of `actor_id`.
    pub async fn pop_balloon(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        requested: PopType,
    ) -> Result<PopOutcome, MatchingError> {
        if actor_id == target_id {
            return Err(MatchingError::Validation(
                "Cannot pop your own balloon".to_string(),
            ));
        }

        let at = self.allocations.now();
        let command = PopCommand {
            actor_id,
            target_id,
            requested,
            day: at.date_naive(),
            max_allocation: self.allocations.max_for(actor_id).await?,
            at,
        };

        let applied = match self.apply_with_retry(&command).await {
            Ok(applied) => applied,
            Err(MatchingError::AlreadyPopped(record)) => {
                // A retry of a DOUBLE that committed earlier must still be able
                // to complete the match.
                self.reconcile_match(actor_id, target_id).await?;
                return Err(MatchingError::AlreadyPopped(record));
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            actor_id = %actor_id,
            target_id = %target_id,
            requested = %requested,
            state = %applied.record.state,
            used = applied.window.used,
            max = applied.window.max,
            "Balloon popped"
        );

        let match_created = if applied.record.state == PopType::Double {
            self.reconcile_match(actor_id, target_id).await?
        } else {
            false
        };

        Ok(PopOutcome {
            allocation_remaining: applied.window.remaining(),
            record: applied.record,
            match_created,
        })
    }

    pub async fn find_pop(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> Result<PopRecord, MatchingError> {
        self.pops
            .find_pop(actor_id, target_id)
            .await?
            .ok_or_else(|| MatchingError::NotFound("Pop record not found".to_string()))
    }

    async fn apply_with_retry(&self, command: &PopCommand) -> Result<AppliedPop, MatchingError> {
        match self.pops.apply_pop(command).await {
            Err(MatchingError::ConcurrencyConflict(reason)) => {
                tracing::debug!(
                    actor_id = %command.actor_id,
                    target_id = %command.target_id,
                    reason = %reason,
                    "Pop conflicted with a concurrent write, retrying"
                );
                self.pops.apply_pop(command).await
            }
            other => other,
        }
    }

    /// Create the match when both directions are DOUBLE.
    ///
    /// Returns `true` only for the call that inserted the match row.
    async fn reconcile_match(&self, actor_id: Uuid, target_id: Uuid) -> Result<bool, MatchingError> {
        let reverse = self.pops.find_pop(target_id, actor_id).await?;
        if !matches!(reverse, Some(ref r) if r.state == PopType::Double) {
            return Ok(false);
        }

        let pair = UserPair::new(actor_id, target_id)
            .ok_or_else(|| MatchingError::Validation("Cannot match a user with themselves".to_string()))?;

        match self.matches.insert_match(pair, self.allocations.now()).await? {
            MatchInsert::Created(created) => {
                let event = MatchCreatedEvent::new(&created, actor_id);
                if let PublishResult::Failed(reason) = self.events.publish(event).await {
                    tracing::warn!(
                        match_id = %created.id,
                        reason = %reason,
                        "Failed to publish match-created event"
                    );
                }
                Ok(true)
            }
            MatchInsert::AlreadyExists => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllocationLimits;
    use crate::services::allocation::FixedClock;
    use crate::services::events::RecordingMatchEventSink;
    use crate::store::{AllocationStore, InMemoryStore};
    use chrono::TimeZone;

    struct Harness {
        store: Arc<InMemoryStore>,
        events: Arc<RecordingMatchEventSink>,
        service: Arc<PopService>,
        tracker: Arc<AllocationTracker>,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let events = Arc::new(RecordingMatchEventSink::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        ));
        let tracker = Arc::new(AllocationTracker::new(
            store.clone(),
            store.clone(),
            AllocationLimits::default(),
            clock,
        ));
        let service = Arc::new(PopService::new(
            store.clone(),
            store.clone(),
            tracker.clone(),
            events.clone(),
        ));
        Harness {
            store,
            events,
            service,
            tracker,
        }
    }

    fn record(state: PopType) -> PopRecord {
        let now = Utc::now();
        PopRecord {
            actor_id: Uuid::from_u128(1),
            target_id: Uuid::from_u128(2),
            state,
            revealed: state == PopType::Double,
            pop_count: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plan_transition_table() {
        assert_eq!(
            plan_transition(None, PopType::Single).unwrap(),
            Transition::Create(PopType::Single)
        );
        assert_eq!(
            plan_transition(Some(&record(PopType::Single)), PopType::Double).unwrap(),
            Transition::Upgrade
        );
        assert_eq!(
            plan_transition(Some(&record(PopType::Single)), PopType::Single).unwrap(),
            Transition::Repeat
        );
        for requested in [PopType::Single, PopType::Double] {
            let err = plan_transition(Some(&record(PopType::Double)), requested).unwrap_err();
            assert!(matches!(err, MatchingError::AlreadyPopped(r) if r.state == PopType::Double));
        }
    }

    #[test]
    fn test_repeat_keeps_single_and_counts() {
        let existing = record(PopType::Single);
        let at = Utc::now();
        let next = Transition::Repeat.apply(Some(existing.clone()), existing.actor_id, existing.target_id, at);
        assert_eq!(next.state, PopType::Single);
        assert!(!next.revealed);
        assert_eq!(next.pop_count, 2);
        assert_eq!(next.created_at, existing.created_at);
    }

    #[tokio::test]
    async fn test_self_pop_rejected() {
        let h = harness();
        let a = Uuid::new_v4();
        let err = h.service.pop_balloon(a, a, PopType::Single).await.unwrap_err();
        assert!(matches!(err, MatchingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_single_then_double_same_actor() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = h.service.pop_balloon(a, b, PopType::Single).await.unwrap();
        assert_eq!(first.record.state, PopType::Single);
        assert!(!first.record.revealed);
        assert_eq!(first.allocation_remaining, 9);

        let second = h.service.pop_balloon(a, b, PopType::Double).await.unwrap();
        assert_eq!(second.record.state, PopType::Double);
        assert!(second.record.revealed);
        assert!(!second.match_created);

        let window = h.tracker.check_allocation(a, h.tracker.today()).await.unwrap();
        assert_eq!(window.used, 2);
        assert_eq!(h.service.find_pop(a, b).await.unwrap().pop_count, 2);
    }

    #[tokio::test]
    async fn test_repeat_single_charges_allocation() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        h.service.pop_balloon(a, b, PopType::Single).await.unwrap();
        let outcome = h.service.pop_balloon(a, b, PopType::Single).await.unwrap();
        assert_eq!(outcome.record.state, PopType::Single);
        assert_eq!(outcome.allocation_remaining, 8);
    }

    #[tokio::test]
    async fn test_mutual_double_creates_one_match() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = h.service.pop_balloon(a, b, PopType::Double).await.unwrap();
        assert!(!first.match_created);
        let second = h.service.pop_balloon(b, a, PopType::Double).await.unwrap();
        assert!(second.match_created);

        assert_eq!(h.store.match_count().await, 1);
        let events = h.events.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].completed_by, b);
    }

    #[tokio::test]
    async fn test_retry_on_double_is_already_popped_and_keeps_one_match() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        h.service.pop_balloon(a, b, PopType::Double).await.unwrap();
        h.service.pop_balloon(b, a, PopType::Double).await.unwrap();

        for (actor, target) in [(a, b), (b, a)] {
            let err = h
                .service
                .pop_balloon(actor, target, PopType::Double)
                .await
                .unwrap_err();
            match err {
                MatchingError::AlreadyPopped(existing) => {
                    assert_eq!(existing.actor_id, actor);
                    assert_eq!(existing.state, PopType::Double);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(h.store.match_count().await, 1);
        assert_eq!(h.events.events().await.len(), 1);

        let window = h.tracker.check_allocation(a, h.tracker.today()).await.unwrap();
        assert_eq!(window.used, 1);
    }

    #[tokio::test]
    async fn test_one_sided_pops_never_match() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        h.service.pop_balloon(a, b, PopType::Double).await.unwrap();
        h.service.pop_balloon(b, a, PopType::Single).await.unwrap();
        assert_eq!(h.store.match_count().await, 0);
        assert!(h.events.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_allocation_leaves_no_record() {
        let h = harness();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let day = h.tracker.today();
        for _ in 0..10 {
            h.store.try_increment(a, day, 10).await.unwrap();
        }

        let err = h.service.pop_balloon(a, b, PopType::Single).await.unwrap_err();
        assert_eq!(err, MatchingError::AllocationExceeded { used: 10, max: 10 });
        assert!(matches!(
            h.service.find_pop(a, b).await.unwrap_err(),
            MatchingError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_tracker_charges_and_pops_share_one_window() {
        let h = harness();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let day = h.tracker.today();
        for _ in 0..9 {
            h.tracker.increment_allocation(a, day).await.unwrap();
        }

        let outcome = h.service.pop_balloon(a, b, PopType::Single).await.unwrap();
        assert_eq!(outcome.allocation_remaining, 0);

        let err = h.service.pop_balloon(a, c, PopType::Single).await.unwrap_err();
        assert_eq!(err, MatchingError::AllocationExceeded { used: 10, max: 10 });
        let err = h.tracker.increment_allocation(a, day).await.unwrap_err();
        assert_eq!(err, MatchingError::AllocationExceeded { used: 10, max: 10 });
    }

    #[tokio::test]
    async fn test_failed_publish_still_creates_match() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let tracker = Arc::new(AllocationTracker::new(
            store.clone(),
            store.clone(),
            AllocationLimits::default(),
            clock,
        ));
        let service = PopService::new(
            store.clone(),
            store.clone(),
            tracker,
            Arc::new(RecordingMatchEventSink::failing()),
        );
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        service.pop_balloon(a, b, PopType::Double).await.unwrap();
        let outcome = service.pop_balloon(b, a, PopType::Double).await.unwrap();
        assert!(outcome.match_created);
        assert_eq!(store.match_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mutual_double_pops_create_exactly_one_match() {
        for _ in 0..20 {
            let h = harness();
            let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

            let s1 = h.service.clone();
            let s2 = h.service.clone();
            let t1 = tokio::spawn(async move { s1.pop_balloon(a, b, PopType::Double).await });
            let t2 = tokio::spawn(async move { s2.pop_balloon(b, a, PopType::Double).await });
            let r1 = t1.await.unwrap().unwrap();
            let r2 = t2.await.unwrap().unwrap();

            assert_eq!(h.store.match_count().await, 1);
            assert!(r1.match_created ^ r2.match_created);
            assert_eq!(h.events.events().await.len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pops_bounded_by_allocation() {
        let h = harness();
        let actor = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..30 {
            let service = h.service.clone();
            let target = Uuid::new_v4();
            handles.push(tokio::spawn(async move {
                service.pop_balloon(actor, target, PopType::Single).await
            }));
        }

        let mut successes = 0;
        let mut exceeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(MatchingError::AllocationExceeded { .. }) => exceeded += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(successes, 10);
        assert_eq!(exceeded, 20);
        let window = h.tracker.check_allocation(actor, h.tracker.today()).await.unwrap();
        assert_eq!(window.used, 10);
    }
}
