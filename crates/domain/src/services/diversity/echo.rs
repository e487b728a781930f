//! Echo-chamber damping.

use crate::config::EchoChamberConfig;
use crate::models::{ExposureBucket, ExposureHistory, ScoredCandidate};

/// Multiplier for a bucket shown `exposures` times; never below the floor.
pub fn damping_multiplier(exposures: u32, config: &EchoChamberConfig) -> f64 {
    let saturation = config.saturation_exposures.max(1) as f64;
    let novelty = 1.0 - (exposures as f64 / saturation).min(1.0);
    config.floor + (1.0 - config.floor) * novelty
}

/// Scale every score by the novelty of its exposure bucket.
pub fn dampen(candidates: &mut [ScoredCandidate], history: &ExposureHistory, config: &EchoChamberConfig) {
    for entry in candidates.iter_mut() {
        let bucket = ExposureBucket::for_candidate(&entry.candidate);
        entry.score *= damping_multiplier(history.exposures(&bucket), config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, CompatibilityScore, Interest, SubScores, UserPair};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_multiplier_bounds() {
        let config = EchoChamberConfig::default();
        assert_eq!(damping_multiplier(0, &config), 1.0);
        assert!((damping_multiplier(10, &config) - 0.9).abs() < 1e-9);
        assert!((damping_multiplier(20, &config) - 0.8).abs() < 1e-9);
        assert!((damping_multiplier(500, &config) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_dampen_uses_bucket_history() {
        let config = EchoChamberConfig::default();
        let mut candidate = Candidate::new(Uuid::new_v4(), 27);
        candidate.interests = vec![Interest::new("jazz", "music")];
        let compatibility = CompatibilityScore {
            pair: UserPair::new(Uuid::new_v4(), candidate.id).unwrap(),
            sub_scores: SubScores::default(),
            total: 50.0,
            degraded: vec![],
            computed_at: Utc::now(),
        };
        let mut history = ExposureHistory::new();
        history.add(ExposureBucket::for_candidate(&candidate), 20);

        let mut list = vec![ScoredCandidate::new(candidate, compatibility)];
        dampen(&mut list, &history, &config);
        assert!((list[0].score - 40.0).abs() < 1e-9);
    }
}
