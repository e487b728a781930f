//! List rebalancing pass.

use std::cmp::Ordering;

use crate::config::RebalanceConfig;
use crate::models::{Candidate, ScoredCandidate};

/// Score descending, then candidate id ascending.
pub fn ranking_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id().cmp(&b.id()))
}

/// Similarity predicate used for clustering; symmetric.
pub fn is_similar(a: &ScoredCandidate, b: &ScoredCandidate, config: &RebalanceConfig) -> bool {
    a.candidate.age.abs_diff(b.candidate.age) < config.similar_age_delta
        && (a.candidate.distance_km - b.candidate.distance_km).abs() < config.similar_distance_delta_km
        && (a.score - b.score).abs() < config.similar_score_delta
}

/// Greedy clustering against each cluster's first member.
///
/// Input order is preserved inside clusters, so a pre-sorted input yields
/// clusters sorted by score.
pub fn cluster(
    candidates: Vec<ScoredCandidate>,
    config: &RebalanceConfig,
) -> Vec<Vec<ScoredCandidate>> {
    let mut clusters: Vec<Vec<ScoredCandidate>> = Vec::new();
    for candidate in candidates {
        match clusters
            .iter_mut()
            .find(|c| is_similar(&c[0], &candidate, config))
        {
            Some(existing) => existing.push(candidate),
            None => clusters.push(vec![candidate]),
        }
    }
    clusters
}

/// Evenly spaced picks from a cluster sorted by score.
fn stride_sample(cluster: Vec<ScoredCandidate>, quota: usize) -> Vec<ScoredCandidate> {
    let len = cluster.len();
    let quota = quota.clamp(1, len);
    let picks: Vec<usize> = (0..quota).map(|i| i * len / quota).collect();
    cluster
        .into_iter()
        .enumerate()
        .filter(|(index, _)| picks.binary_search(index).is_ok())
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Per-candidate diversity bonus in [0, 100].
fn diversity_bonus(
    viewer: &Candidate,
    candidate: &Candidate,
    verified_is_minority: Option<bool>,
    config: &RebalanceConfig,
) -> f64 {
    let mut bonus = 0.0;

    if verified_is_minority == Some(candidate.verified) {
        bonus += config.verification_bonus;
    }

    let viewer_tags = viewer.lifestyle_set();
    if candidate
        .lifestyle_set()
        .iter()
        .any(|tag| !viewer_tags.contains(tag))
    {
        bonus += config.lifestyle_bonus;
    }

    if let (Some(mine), Some(theirs)) = (viewer.active_hours, candidate.active_hours) {
        if mine.is_complementary(theirs) {
            bonus += config.active_hours_bonus;
        }
    }

    if candidate.distance_km >= config.mid_distance_min_km
        && candidate.distance_km < config.mid_distance_max_km
    {
        bonus += config.distance_bonus;
    }

    bonus.min(100.0)
}

/// Which verification status is underrepresented, if either is.
fn verification_minority(candidates: &[ScoredCandidate]) -> Option<bool> {
    let verified = candidates.iter().filter(|c| c.candidate.verified).count();
    let unverified = candidates.len() - verified;
    match verified.cmp(&unverified) {
        Ordering::Less => Some(true),
        Ordering::Greater => Some(false),
        Ordering::Equal => None,
    }
}

/// Cluster, sample each cluster proportionally toward `target` and blend a
/// diversity bonus into every surviving score.
///
/// The result is sorted by [`ranking_order`] and not truncated.
pub fn rebalance(
    viewer: &Candidate,
    mut candidates: Vec<ScoredCandidate>,
    target: usize,
    config: &RebalanceConfig,
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() || target == 0 {
        return Vec::new();
    }

    candidates.sort_by(ranking_order);
    let total = candidates.len();

    let mut selected: Vec<ScoredCandidate> = cluster(candidates, config)
        .into_iter()
        .flat_map(|members| {
            let share = (members.len() as f64 * target as f64 / total as f64).round() as usize;
            stride_sample(members, share.max(1))
        })
        .collect();

    let minority = verification_minority(&selected);
    let w = config.blend_weight;
    for entry in &mut selected {
        let bonus = diversity_bonus(viewer, &entry.candidate, minority, config);
        entry.score = entry.score * (1.0 - w) + bonus * w;
    }

    selected.sort_by(ranking_order);
    selected
}
