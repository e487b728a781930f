//! Domain models for the matching subsystem.

pub mod allocation;
pub mod candidate;
pub mod compatibility;
pub mod matching;
pub mod pop;
pub mod ranking;

pub use allocation::{AllocationResponse, AllocationWindow, SubscriptionTier};
pub use candidate::{ActiveHours, Candidate, EngagementMetrics, Interest, Personality};
pub use compatibility::{CompatibilityScore, DegradedSignal, SubScores, UserPair};
pub use matching::{Match, MatchCreatedEvent, MatchInsert, MatchResponse};
pub use pop::{PopOutcome, PopRecord, PopRecordResponse, PopRequest, PopResponse, PopType};
pub use ranking::{
    AgeBracket, ExposureBucket, ExposureHistory, RankedCandidate, RankingRequest,
    RankingResponse, ScoredCandidate,
};
