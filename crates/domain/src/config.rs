//! Matching configuration.
//!
//! Every weight, threshold and quota used by the scorer, the diversity
//! balancer and the allocation gate lives here. The structure is loaded once
//! at startup (see the `[matching]` section of `config/default.toml`) and
//! handed to the services by reference.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::SubscriptionTier;

/// Tolerance used when checking that weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration validation error.
#[derive(Debug, Error, PartialEq)]
pub enum MatchingConfigError {
    #[error("Scoring weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Root matching configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub scoring: ScoringConfig,
    pub diversity: DiversityConfig,
    pub rebalance: RebalanceConfig,
    pub echo_chamber: EchoChamberConfig,
    pub allocation: AllocationLimits,
    pub ranking: RankingConfig,
}

/// Weights of the six scoring sub-signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub interests: f64,
    pub prompts: f64,
    pub engagement: f64,
    pub diversity: f64,
    pub behavioral: f64,
    pub model: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            interests: 0.25,
            prompts: 0.20,
            engagement: 0.15,
            diversity: 0.10,
            behavioral: 0.10,
            model: 0.20,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.interests + self.prompts + self.engagement + self.diversity + self.behavioral + self.model
    }
}

/// Compatibility scorer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: SignalWeights,

    /// Points per shared (interest, category) pair.
    pub points_per_shared_interest: f64,

    /// Engagement blend of streak / response rate / completion.
    pub engagement_streak_weight: f64,
    pub engagement_response_weight: f64,
    pub engagement_completion_weight: f64,

    /// Streak length (days) that earns the full streak component.
    pub streak_saturation_days: f64,

    /// Bonus when the pair never popped each other.
    pub novelty_bonus: f64,

    /// Points per overlapping previously expressed interest.
    pub expressed_interest_points: f64,

    /// Cap for the expressed-interest bonus.
    pub expressed_interest_cap: f64,

    /// Prediction used when the predictor is unavailable.
    pub neutral_prediction: f64,

    /// Total assigned to a candidate whose scoring task failed outright.
    pub fallback_total: f64,

    pub embedding_timeout_ms: u64,
    pub prediction_timeout_ms: u64,

    /// Prompts are cut to this many characters before string similarity.
    pub prompt_similarity_max_chars: usize,

    /// Budget for scoring a whole pool; unfinished candidates get the fallback.
    pub batch_deadline_ms: u64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            points_per_shared_interest: 10.0,
            engagement_streak_weight: 0.40,
            engagement_response_weight: 0.35,
            engagement_completion_weight: 0.25,
            streak_saturation_days: 30.0,
            novelty_bonus: 60.0,
            expressed_interest_points: 10.0,
            expressed_interest_cap: 40.0,
            neutral_prediction: 0.5,
            fallback_total: 50.0,
            embedding_timeout_ms: 250,
            prediction_timeout_ms: 250,
            prompt_similarity_max_chars: 280,
            batch_deadline_ms: 2_000,
        }
    }
}

impl ScoringConfig {
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_millis(self.prediction_timeout_ms)
    }

    pub fn batch_deadline(&self) -> Duration {
        Duration::from_millis(self.batch_deadline_ms)
    }
}

/// Buckets of the per-pair diversity feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub base: f64,
    pub age_gap_low_years: u32,
    pub age_gap_high_years: u32,
    pub age_gap_bonus: f64,
    pub age_gap_penalty: f64,
    pub distance_low_km: f64,
    pub distance_high_km: f64,
    pub distance_bonus: f64,
    pub distance_penalty: f64,
    pub overlap_low_pct: f64,
    pub overlap_high_pct: f64,
    pub overlap_bonus: f64,
    pub overlap_low_penalty: f64,
    pub overlap_high_penalty: f64,
    pub lifestyle_points_per_tag: f64,
    pub lifestyle_cap: f64,
    pub personality_opposite_bonus: f64,
    pub personality_ambivert_bonus: f64,
    pub personality_cap: f64,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            base: 50.0,
            age_gap_low_years: 5,
            age_gap_high_years: 15,
            age_gap_bonus: 10.0,
            age_gap_penalty: 10.0,
            distance_low_km: 5.0,
            distance_high_km: 30.0,
            distance_bonus: 15.0,
            distance_penalty: 5.0,
            overlap_low_pct: 30.0,
            overlap_high_pct: 70.0,
            overlap_bonus: 20.0,
            overlap_low_penalty: 5.0,
            overlap_high_penalty: 10.0,
            lifestyle_points_per_tag: 5.0,
            lifestyle_cap: 10.0,
            personality_opposite_bonus: 10.0,
            personality_ambivert_bonus: 5.0,
            personality_cap: 10.0,
        }
    }
}

/// List rebalancing pass configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebalanceConfig {
    /// Two candidates are similar when every delta is strictly below its threshold.
    pub similar_age_delta: u32,
    pub similar_distance_delta_km: f64,
    pub similar_score_delta: f64,

    /// Blend weight `w` in `final = base * (1 - w) + bonus * w`.
    pub blend_weight: f64,

    pub verification_bonus: f64,
    pub lifestyle_bonus: f64,
    pub active_hours_bonus: f64,
    pub distance_bonus: f64,
    pub mid_distance_min_km: f64,
    pub mid_distance_max_km: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            similar_age_delta: 3,
            similar_distance_delta_km: 5.0,
            similar_score_delta: 10.0,
            blend_weight: 0.3,
            verification_bonus: 25.0,
            lifestyle_bonus: 25.0,
            active_hours_bonus: 25.0,
            distance_bonus: 25.0,
            mid_distance_min_km: 5.0,
            mid_distance_max_km: 30.0,
        }
    }
}

/// Echo-chamber damping configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoChamberConfig {
    /// Lowest multiplier applied to a fully saturated bucket.
    pub floor: f64,

    /// Exposures after which a bucket has no novelty left.
    pub saturation_exposures: u32,

    /// Length of the rolling exposure window.
    pub history_days: i64,
}

impl Default for EchoChamberConfig {
    fn default() -> Self {
        Self {
            floor: 0.8,
            saturation_exposures: 20,
            history_days: 14,
        }
    }
}

/// Daily pop quota per subscription tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationLimits {
    pub free: u32,
    pub plus: u32,
    pub premium: u32,
}

impl Default for AllocationLimits {
    fn default() -> Self {
        Self {
            free: 10,
            plus: 25,
            premium: 50,
        }
    }
}

impl AllocationLimits {
    pub fn max_for(&self, tier: SubscriptionTier) -> u32 {
        match tier {
            SubscriptionTier::Free => self.free,
            SubscriptionTier::Plus => self.plus,
            SubscriptionTier::Premium => self.premium,
        }
    }
}

/// Ranking request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 200,
        }
    }
}

impl MatchingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), MatchingConfigError> {
        let weights = &self.scoring.weights;
        let all_weights = [
            weights.interests,
            weights.prompts,
            weights.engagement,
            weights.diversity,
            weights.behavioral,
            weights.model,
        ];
        if all_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MatchingConfigError::InvalidValue(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchingConfigError::WeightSum(sum));
        }

        let engagement_sum = self.scoring.engagement_streak_weight
            + self.scoring.engagement_response_weight
            + self.scoring.engagement_completion_weight;
        if (engagement_sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchingConfigError::InvalidValue(format!(
                "engagement weights must sum to 1.0, got {}",
                engagement_sum
            )));
        }

        if self.scoring.streak_saturation_days <= 0.0 {
            return Err(MatchingConfigError::InvalidValue(
                "streak_saturation_days must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.scoring.neutral_prediction) {
            return Err(MatchingConfigError::InvalidValue(
                "neutral_prediction must be in [0, 1]".to_string(),
            ));
        }

        if self.scoring.embedding_timeout_ms == 0 || self.scoring.prediction_timeout_ms == 0 {
            return Err(MatchingConfigError::InvalidValue(
                "dependency timeouts must be > 0".to_string(),
            ));
        }

        if self.scoring.prompt_similarity_max_chars == 0 || self.scoring.batch_deadline_ms == 0 {
            return Err(MatchingConfigError::InvalidValue(
                "prompt_similarity_max_chars and batch_deadline_ms must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rebalance.blend_weight) {
            return Err(MatchingConfigError::InvalidValue(format!(
                "blend_weight must be in [0, 1], got {}",
                self.rebalance.blend_weight
            )));
        }

        if !(0.0..=1.0).contains(&self.echo_chamber.floor) {
            return Err(MatchingConfigError::InvalidValue(
                "echo_chamber.floor must be in [0, 1]".to_string(),
            ));
        }

        if self.echo_chamber.saturation_exposures == 0 {
            return Err(MatchingConfigError::InvalidValue(
                "echo_chamber.saturation_exposures must be > 0".to_string(),
            ));
        }

        if self.diversity.age_gap_low_years >= self.diversity.age_gap_high_years {
            return Err(MatchingConfigError::InvalidValue(
                "diversity age gap buckets must be increasing".to_string(),
            ));
        }

        if self.diversity.distance_low_km >= self.diversity.distance_high_km {
            return Err(MatchingConfigError::InvalidValue(
                "diversity distance buckets must be increasing".to_string(),
            ));
        }

        if self.allocation.free == 0 || self.allocation.plus == 0 || self.allocation.premium == 0 {
            return Err(MatchingConfigError::InvalidValue(
                "allocation maxima must be > 0".to_string(),
            ));
        }

        if self.ranking.default_limit == 0 || self.ranking.default_limit > self.ranking.max_limit {
            return Err(MatchingConfigError::InvalidValue(
                "ranking.default_limit must be in 1..=max_limit".to_string(),
            ));
        }

        Ok(())
    }
}
