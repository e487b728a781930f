//! Ranking request/response and exposure history model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::{Candidate, CompatibilityScore, SubScores};

/// Age bracket used to bucket exposure history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "18-24")]
    Under25,
    #[serde(rename = "25-29")]
    From25To29,
    #[serde(rename = "30-34")]
    From30To34,
    #[serde(rename = "35-39")]
    From35To39,
    #[serde(rename = "40-49")]
    From40To49,
    #[serde(rename = "50+")]
    Over50,
}

impl AgeBracket {
    pub fn for_age(age: u32) -> Self {
        match age {
            0..=24 => AgeBracket::Under25,
            25..=29 => AgeBracket::From25To29,
            30..=34 => AgeBracket::From30To34,
            35..=39 => AgeBracket::From35To39,
            40..=49 => AgeBracket::From40To49,
            _ => AgeBracket::Over50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Under25 => "18-24",
            AgeBracket::From25To29 => "25-29",
            AgeBracket::From30To34 => "30-34",
            AgeBracket::From35To39 => "35-39",
            AgeBracket::From40To49 => "40-49",
            AgeBracket::Over50 => "50+",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "18-24" => Some(AgeBracket::Under25),
            "25-29" => Some(AgeBracket::From25To29),
            "30-34" => Some(AgeBracket::From30To34),
            "35-39" => Some(AgeBracket::From35To39),
            "40-49" => Some(AgeBracket::From40To49),
            "50+" => Some(AgeBracket::Over50),
            _ => None,
        }
    }
}

/// Category recorded for candidates without any interests.
pub const NO_CATEGORY: &str = "none";

/// (age bracket, dominant interest category) of a shown candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureBucket {
    pub age_bracket: AgeBracket,
    pub category: String,
}

impl ExposureBucket {
    pub fn for_candidate(candidate: &Candidate) -> Self {
        Self {
            age_bracket: AgeBracket::for_age(candidate.age),
            category: candidate
                .dominant_category()
                .unwrap_or(NO_CATEGORY)
                .to_lowercase(),
        }
    }
}

/// Rolling count of exposures per bucket for one viewer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureHistory {
    counts: HashMap<ExposureBucket, u32>,
}

impl ExposureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, bucket: ExposureBucket) {
        *self.counts.entry(bucket).or_default() += 1;
    }

    pub fn add(&mut self, bucket: ExposureBucket, count: u32) {
        *self.counts.entry(bucket).or_default() += count;
    }

    pub fn exposures(&self, bucket: &ExposureBucket) -> u32 {
        self.counts.get(bucket).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// A candidate carried through the ranking pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub compatibility: CompatibilityScore,
    /// Score after rebalancing and damping; starts at the compatibility total.
    pub score: f64,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, compatibility: CompatibilityScore) -> Self {
        let score = compatibility.total;
        Self {
            candidate,
            compatibility,
            score,
        }
    }

    pub fn id(&self) -> Uuid {
        self.candidate.id
    }
}

/// Request payload for ranking a candidate pool.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RankingRequest {
    #[validate(nested)]
    pub viewer: Candidate,

    #[validate(length(max = 500, message = "At most 500 candidates per request"), nested)]
    pub candidates: Vec<Candidate>,

    /// Upper bound is `ranking.max_limit`, checked by the ranking service.
    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<usize>,
}

/// One entry of the ranking output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub candidate_id: Uuid,
    /// Final score after rebalancing and echo-chamber damping.
    pub score: f64,
    /// Compatibility total before rebalancing.
    pub base_score: f64,
    pub breakdown: SubScores,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<super::DegradedSignal>,
}

impl From<ScoredCandidate> for RankedCandidate {
    fn from(s: ScoredCandidate) -> Self {
        Self {
            candidate_id: s.candidate.id,
            score: s.score,
            base_score: s.compatibility.total,
            breakdown: s.compatibility.sub_scores,
            degraded: s.compatibility.degraded,
        }
    }
}

/// Response payload for a ranking request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub rankings: Vec<RankedCandidate>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interest;

    #[test]
    fn test_age_brackets() {
        assert_eq!(AgeBracket::for_age(18), AgeBracket::Under25);
        assert_eq!(AgeBracket::for_age(25), AgeBracket::From25To29);
        assert_eq!(AgeBracket::for_age(34), AgeBracket::From30To34);
        assert_eq!(AgeBracket::for_age(49), AgeBracket::From40To49);
        assert_eq!(AgeBracket::for_age(72), AgeBracket::Over50);
        assert_eq!(AgeBracket::parse(AgeBracket::Over50.as_str()), Some(AgeBracket::Over50));
    }

    #[test]
    fn test_bucket_for_candidate_without_interests() {
        let c = Candidate::new(Uuid::nil(), 27);
        let bucket = ExposureBucket::for_candidate(&c);
        assert_eq!(bucket.age_bracket, AgeBracket::From25To29);
        assert_eq!(bucket.category, NO_CATEGORY);
    }

    #[test]
    fn test_bucket_normalizes_category_case() {
        let mut c = Candidate::new(Uuid::nil(), 41);
        c.interests = vec![Interest::new("Jazz", "Music")];
        assert_eq!(ExposureBucket::for_candidate(&c).category, "music");
    }

    #[test]
    fn test_exposure_history_counts() {
        let bucket = ExposureBucket {
            age_bracket: AgeBracket::From30To34,
            category: "music".to_string(),
        };
        let mut history = ExposureHistory::new();
        assert!(history.is_empty());
        history.record(bucket.clone());
        history.add(bucket.clone(), 4);
        assert_eq!(history.exposures(&bucket), 5);
    }

    #[test]
    fn test_ranking_request_limit_validation() {
        let json = r#"{
            "viewer": {"id": "550e8400-e29b-41d4-a716-446655440000", "age": 30},
            "candidates": [],
            "limit": 0
        }"#;
        let request: RankingRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }
}
