//! Repository implementations of the domain store contracts.

pub mod allocation;
pub mod compatibility_score;
pub mod exposure;
pub mod match_record;
pub mod pop;
pub mod subscription;

pub use allocation::AllocationRepository;
pub use compatibility_score::CompatibilityScoreRepository;
pub use exposure::ExposureRepository;
pub use match_record::MatchRepository;
pub use pop::PopRepository;
pub use subscription::SubscriptionRepository;

use sqlx::PgPool;

/// All repositories over one connection pool.
#[derive(Clone)]
pub struct PgStores {
    pub scores: CompatibilityScoreRepository,
    pub allocations: AllocationRepository,
    pub pops: PopRepository,
    pub matches: MatchRepository,
    pub exposures: ExposureRepository,
    pub subscriptions: SubscriptionRepository,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            scores: CompatibilityScoreRepository::new(pool.clone()),
            allocations: AllocationRepository::new(pool.clone()),
            pops: PopRepository::new(pool.clone()),
            matches: MatchRepository::new(pool.clone()),
            exposures: ExposureRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool),
        }
    }
}
