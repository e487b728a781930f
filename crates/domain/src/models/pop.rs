//! Pop interaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of pop, which is also the state of a pop record.
///
/// `Single` is a partial reveal; `Double` is a full reveal and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PopType {
    Single,
    Double,
}

impl PopType {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PopType::Single => "single",
            PopType::Double => "double",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(PopType::Single),
            "double" => Some(PopType::Double),
            _ => None,
        }
    }
}

impl std::fmt::Display for PopType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Directed interaction state from `actor_id` toward `target_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopRecord {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub state: PopType,
    pub revealed: bool,
    /// Number of successful pops applied to this record.
    pub pop_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for popping a balloon.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopRequest {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub pop_type: PopType,
}

/// Result of a successful pop.
#[derive(Debug, Clone, PartialEq)]
pub struct PopOutcome {
    pub record: PopRecord,
    pub match_created: bool,
    pub allocation_remaining: u32,
}

/// Response payload for pop operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopResponse {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub resulting_state: PopType,
    pub revealed: bool,
    pub match_created: bool,
    pub allocation_remaining: u32,
}

impl From<PopOutcome> for PopResponse {
    fn from(outcome: PopOutcome) -> Self {
        Self {
            actor_id: outcome.record.actor_id,
            target_id: outcome.record.target_id,
            resulting_state: outcome.record.state,
            revealed: outcome.record.revealed,
            match_created: outcome.match_created,
            allocation_remaining: outcome.allocation_remaining,
        }
    }
}

/// Response payload describing a stored pop record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopRecordResponse {
    pub actor_id: Uuid,
    pub target_id: Uuid,
    pub state: PopType,
    pub revealed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PopRecord> for PopRecordResponse {
    fn from(r: PopRecord) -> Self {
        Self {
            actor_id: r.actor_id,
            target_id: r.target_id,
            state: r.state,
            revealed: r.revealed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
