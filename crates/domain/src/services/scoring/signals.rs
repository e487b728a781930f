//! Pure sub-signal computations.

use std::collections::BTreeSet;

use crate::config::ScoringConfig;
use crate::models::{Candidate, Interest};

const MAX_SCORE: f64 = 100.0;

/// Shared (interest, category) pairs times the per-interest points, capped at 100.
pub fn interest_overlap(a: &Candidate, b: &Candidate, config: &ScoringConfig) -> f64 {
    let shared = a.interest_set().intersection(&b.interest_set()).count();
    (shared as f64 * config.points_per_shared_interest).min(MAX_SCORE)
}

/// Weighted blend of the pair's average streak, response rate and completion.
pub fn engagement(a: &Candidate, b: &Candidate, config: &ScoringConfig) -> f64 {
    let streak = (activity(a, config) + activity(b, config)) / 2.0;
    let response = (a.engagement.response_rate + b.engagement.response_rate) / 2.0;
    let completion = (a.engagement.profile_completion + b.engagement.profile_completion) / 2.0;

    let blended = config.engagement_streak_weight * streak
        + config.engagement_response_weight * response
        + config.engagement_completion_weight * completion;
    (blended * MAX_SCORE).clamp(0.0, MAX_SCORE)
}

/// Active streak normalised to [0, 1] against the saturation length.
pub fn activity(candidate: &Candidate, config: &ScoringConfig) -> f64 {
    (candidate.engagement.active_streak_days as f64 / config.streak_saturation_days).min(1.0)
}

/// Novelty bonus plus overlap with interests each side expressed before.
///
/// Overlap counts A's expressed interests found in B's profile and vice
/// versa, so the signal is symmetric in the pair.
pub fn behavioral(
    a: &Candidate,
    b: &Candidate,
    has_prior_pops: bool,
    config: &ScoringConfig,
) -> f64 {
    let novelty = if has_prior_pops { 0.0 } else { config.novelty_bonus };
    let overlaps = expressed_overlap(a, b) + expressed_overlap(b, a);
    let expressed =
        (overlaps as f64 * config.expressed_interest_points).min(config.expressed_interest_cap);
    (novelty + expressed).min(MAX_SCORE)
}

fn expressed_overlap(viewer: &Candidate, other: &Candidate) -> usize {
    let expressed: BTreeSet<&Interest> = viewer.expressed_interests.iter().collect();
    expressed.intersection(&other.interest_set()).count()
}
