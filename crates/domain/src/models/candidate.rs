//! Candidate profile snapshot used for scoring.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use validator::Validate;

/// An interest tagged with its category, e.g. ("bouldering", "sports").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    #[validate(length(min = 1, max = 64, message = "Interest name must be 1-64 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "Interest category must be 1-64 characters"))]
    pub category: String,
}

impl Interest {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Self-reported personality type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Introvert,
    Ambivert,
    Extrovert,
}

/// Part of the day a user is usually active in the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveHours {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl ActiveHours {
    fn slot(self) -> u8 {
        match self {
            ActiveHours::Morning => 0,
            ActiveHours::Afternoon => 1,
            ActiveHours::Evening => 2,
            ActiveHours::Night => 3,
        }
    }

    /// Adjacent periods overlap at their edges without being identical.
    pub fn is_complementary(self, other: ActiveHours) -> bool {
        let distance = (self.slot() as i8 - other.slot() as i8).rem_euclid(4);
        distance == 1 || distance == 3
    }
}

/// Engagement metrics of a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Consecutive days with activity.
    #[serde(default)]
    pub active_streak_days: u32,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_unit_interval"))]
    pub response_rate: f64,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_unit_interval"))]
    pub profile_completion: f64,
}

/// Snapshot of a profile for one scoring pass.
///
/// `distance_km` is the distance from the requesting user; the requester's
/// own snapshot carries 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,

    #[validate(range(min = 18, max = 120, message = "Age must be between 18 and 120"))]
    pub age: u32,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_distance_km"))]
    pub distance_km: f64,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 interests"), nested)]
    pub interests: Vec<Interest>,

    #[serde(default)]
    #[validate(
        length(max = 10, message = "At most 10 prompts"),
        custom(function = "shared::validation::validate_prompts")
    )]
    pub prompts: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub engagement: EngagementMetrics,

    #[serde(default)]
    pub verified: bool,

    #[serde(default)]
    pub premium: bool,

    #[serde(default)]
    #[validate(
        length(max = 20, message = "At most 20 lifestyle tags"),
        custom(function = "shared::validation::validate_labels")
    )]
    pub lifestyle: Vec<String>,

    #[serde(default)]
    pub personality: Option<Personality>,

    #[serde(default)]
    pub active_hours: Option<ActiveHours>,

    /// Interests of profiles this user previously popped.
    #[serde(default)]
    #[validate(length(max = 100, message = "At most 100 expressed interests"), nested)]
    pub expressed_interests: Vec<Interest>,
}

impl Candidate {
    /// A minimal snapshot; mostly useful as a starting point in tests.
    pub fn new(id: Uuid, age: u32) -> Self {
        Self {
            id,
            age,
            distance_km: 0.0,
            interests: Vec::new(),
            prompts: Vec::new(),
            engagement: EngagementMetrics::default(),
            verified: false,
            premium: false,
            lifestyle: Vec::new(),
            personality: None,
            active_hours: None,
            expressed_interests: Vec::new(),
        }
    }

    /// Deduplicated interests.
    pub fn interest_set(&self) -> BTreeSet<&Interest> {
        self.interests.iter().collect()
    }

    /// Deduplicated lifestyle tags, lower-cased.
    pub fn lifestyle_set(&self) -> BTreeSet<String> {
        self.lifestyle
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .collect()
    }

    /// Most frequent interest category; ties go to the alphabetically first.
    pub fn dominant_category(&self) -> Option<&str> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for interest in self.interest_set() {
            *counts.entry(interest.category.as_str()).or_default() += 1;
        }
        let mut best: Option<(&str, usize)> = None;
        for (category, count) in counts {
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((category, count)),
            }
        }
        best.map(|(category, _)| category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        let mut c = Candidate::new(Uuid::nil(), 29);
        c.interests = vec![
            Interest::new("hiking", "outdoors"),
            Interest::new("climbing", "outdoors"),
            Interest::new("jazz", "music"),
        ];
        c
    }

    #[test]
    fn test_candidate_deserialization_defaults() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "age": 31
        }"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.age, 31);
        assert_eq!(c.distance_km, 0.0);
        assert!(c.interests.is_empty());
        assert!(c.personality.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_candidate_deserialization_full() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "age": 27,
            "distanceKm": 12.5,
            "interests": [{"name": "hiking", "category": "outdoors"}],
            "prompts": ["Sunday morning hikes"],
            "engagement": {"activeStreakDays": 4, "responseRate": 0.8, "profileCompletion": 0.9},
            "verified": true,
            "lifestyle": ["non-smoker"],
            "personality": "introvert",
            "activeHours": "evening"
        }"#;
        let c: Candidate = serde_json::from_str(json).unwrap();
        assert_eq!(c.personality, Some(Personality::Introvert));
        assert_eq!(c.active_hours, Some(ActiveHours::Evening));
        assert_eq!(c.engagement.active_streak_days, 4);
        assert!(c.verified);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_candidate_validation_rejects_bad_age() {
        let c = Candidate::new(Uuid::nil(), 15);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_candidate_validation_rejects_bad_rate() {
        let mut c = Candidate::new(Uuid::nil(), 30);
        c.engagement.response_rate = 1.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_dominant_category() {
        assert_eq!(candidate().dominant_category(), Some("outdoors"));
        assert_eq!(Candidate::new(Uuid::nil(), 30).dominant_category(), None);
    }

    #[test]
    fn test_dominant_category_tie_breaks_alphabetically() {
        let mut c = Candidate::new(Uuid::nil(), 30);
        c.interests = vec![Interest::new("jazz", "music"), Interest::new("chess", "games")];
        assert_eq!(c.dominant_category(), Some("games"));
    }

    #[test]
    fn test_interest_set_deduplicates() {
        let mut c = candidate();
        c.interests.push(Interest::new("hiking", "outdoors"));
        assert_eq!(c.interest_set().len(), 3);
    }

    #[test]
    fn test_active_hours_complementary() {
        assert!(ActiveHours::Morning.is_complementary(ActiveHours::Afternoon));
        assert!(ActiveHours::Night.is_complementary(ActiveHours::Morning));
        assert!(!ActiveHours::Morning.is_complementary(ActiveHours::Morning));
        assert!(!ActiveHours::Morning.is_complementary(ActiveHours::Evening));
    }
}
