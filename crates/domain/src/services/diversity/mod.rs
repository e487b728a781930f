//! Diversity balancer.
//!
//! Three separate pieces: the pure per-pair feature consumed by the scorer,
//! the list rebalancing pass, and echo-chamber damping. [`DiversityBalancer`]
//! runs the last two over a scored list.

pub mod echo;
pub mod feature;
pub mod rebalance;

use std::sync::Arc;

use crate::config::MatchingConfig;
use crate::models::{Candidate, ExposureHistory, ScoredCandidate};

pub use echo::{damping_multiplier, dampen};
pub use feature::pair_diversity;
pub use rebalance::{rebalance, ranking_order};

pub struct DiversityBalancer {
    config: Arc<MatchingConfig>,
}

impl DiversityBalancer {
    pub fn new(config: Arc<MatchingConfig>) -> Self {
        Self { config }
    }

    /// Rebalance, dampen, sort and truncate to `target`.
    pub fn balance(
        &self,
        viewer: &Candidate,
        candidates: Vec<ScoredCandidate>,
        history: &ExposureHistory,
        target: usize,
    ) -> Vec<ScoredCandidate> {
        let mut ranked = rebalance(viewer, candidates, target, &self.config.rebalance);
        dampen(&mut ranked, history, &self.config.echo_chamber);
        ranked.sort_by(ranking_order);
        ranked.truncate(target);
        ranked
    }
}
