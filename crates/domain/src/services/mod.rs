//! Domain services for the matching subsystem.
//!
//! Services contain business logic that operates on domain models and the
//! store contracts.

pub mod allocation;
pub mod diversity;
pub mod events;
pub mod pop;
pub mod ranking;
pub mod scoring;

pub use allocation::{AllocationTracker, Clock, FixedClock, SystemClock};
pub use diversity::{pair_diversity, DiversityBalancer};
pub use events::{LoggingMatchEventSink, MatchEventSink, PublishResult, RecordingMatchEventSink};
pub use pop::{plan_transition, PopService, Transition};
pub use ranking::RankingService;
pub use scoring::{
    CompatibilityScorer, EmbeddingProvider, NeutralPredictor, PairContext, Predictor,
    PromptSimilarityChain,
};
