//! Match-created event publishing.
//!
//! Delivery is at-least-once: the pop flow publishes after the match row is
//! committed, and a failed publish is logged, never rolled back.

use tokio::sync::Mutex;

use crate::models::MatchCreatedEvent;

/// Result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    Published,
    Failed(String),
}

/// Downstream consumer of match-created events.
#[async_trait::async_trait]
pub trait MatchEventSink: Send + Sync {
    async fn publish(&self, event: MatchCreatedEvent) -> PublishResult;
}

/// Sink that only writes the event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMatchEventSink;

#[async_trait::async_trait]
impl MatchEventSink for LoggingMatchEventSink {
    async fn publish(&self, event: MatchCreatedEvent) -> PublishResult {
        tracing::info!(
            match_id = %event.match_id,
            user_a = %event.user_a,
            user_b = %event.user_b,
            completed_by = %event.completed_by,
            "Match created"
        );
        PublishResult::Published
    }
}

/// Sink that keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingMatchEventSink {
    events: Mutex<Vec<MatchCreatedEvent>>,
    simulate_failure: bool,
}

impl RecordingMatchEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records events but reports every publish as failed.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            simulate_failure: true,
        }
    }

    pub async fn events(&self) -> Vec<MatchCreatedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MatchEventSink for RecordingMatchEventSink {
    async fn publish(&self, event: MatchCreatedEvent) -> PublishResult {
        self.events.lock().await.push(event);
        if self.simulate_failure {
            return PublishResult::Failed("Simulated failure".to_string());
        }
        PublishResult::Published
    }
}
