//! Mutual match domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserPair;

/// Mutual connection between two users who double-popped each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: Uuid,
    pub pair: UserPair,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a match insert against the unordered-pair uniqueness constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchInsert {
    Created(Match),
    /// Another request already created the match for this pair.
    AlreadyExists,
}

/// Event emitted once per created match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCreatedEvent {
    pub match_id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    /// The user whose pop completed the match.
    pub completed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MatchCreatedEvent {
    pub fn new(m: &Match, completed_by: Uuid) -> Self {
        Self {
            match_id: m.id,
            user_a: m.pair.low(),
            user_b: m.pair.high(),
            completed_by,
            created_at: m.created_at,
        }
    }
}

/// Response payload for match lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub match_id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Match> for MatchResponse {
    fn from(m: Match) -> Self {
        Self {
            match_id: m.id,
            user_a: m.pair.low(),
            user_b: m.pair.high(),
            created_at: m.created_at,
        }
    }
}
