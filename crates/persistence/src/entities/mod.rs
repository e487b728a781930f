//! Entity definitions (database row mappings).

pub mod allocation_window;
pub mod compatibility_score;
pub mod exposure_event;
pub mod match_record;
pub mod pop_record;
pub mod subscription;

pub use allocation_window::AllocationWindowEntity;
pub use compatibility_score::CompatibilityScoreEntity;
pub use exposure_event::ExposureCountEntity;
pub use match_record::MatchEntity;
pub use pop_record::PopRecordEntity;
pub use subscription::SubscriptionEntity;
