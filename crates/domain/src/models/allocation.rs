//! Daily pop allocation domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier; decides the daily pop quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Plus,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Plus => "plus",
            SubscriptionTier::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(SubscriptionTier::Free),
            "plus" => Some(SubscriptionTier::Plus),
            "premium" => Some(SubscriptionTier::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pop usage of one user on one calendar day. `used <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationWindow {
    pub user_id: Uuid,
    pub day: NaiveDate,
    pub used: u32,
    pub max: u32,
}

impl AllocationWindow {
    pub fn new(user_id: Uuid, day: NaiveDate, max: u32) -> Self {
        Self {
            user_id,
            day,
            used: 0,
            max,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

/// Response payload for allocation lookups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub used: u32,
    pub max: u32,
    pub remaining: u32,
}

impl From<AllocationWindow> for AllocationResponse {
    fn from(w: AllocationWindow) -> Self {
        Self {
            user_id: w.user_id,
            date: w.day,
            used: w.used,
            max: w.max,
            remaining: w.remaining(),
        }
    }
}
