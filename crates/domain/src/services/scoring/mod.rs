//! Compatibility scorer.
//!
//! Fuses six weighted sub-signals into a total in [0, 100]:
//!
//! | signal      | source                                     |
//! |-------------|--------------------------------------------|
//! | interests   | shared (name, category) pairs              |
//! | prompts     | embedding cosine, Jaro-Winkler fallback    |
//! | engagement  | streak, response rate, completion          |
//! | diversity   | per-pair diversity feature                 |
//! | behavioral  | novelty bonus and expressed interests      |
//! | model       | external predictor, neutral fallback       |
//!
//! A failing dependency never aborts scoring; the fallback value is used and
//! the signal is listed in [`CompatibilityScore::degraded`].

pub mod prediction;
pub mod signals;
pub mod similarity;

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::MatchingConfig;
use crate::errors::{DependencyError, MatchingError};
use crate::models::{Candidate, CompatibilityScore, DegradedSignal, SubScores, UserPair};
use crate::services::diversity::pair_diversity;
use crate::store::ScoreCache;

pub use prediction::{FeatureVector, NeutralPredictor, Predictor, FEATURE_COUNT};
pub use similarity::{
    EmbeddingProvider, EmbeddingSimilarity, JaroWinklerSimilarity, PromptScore, PromptSimilarity,
    PromptSimilarityChain,
};

/// Facts about the pair that come from stored history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairContext {
    /// Either user popped the other at some point.
    pub has_prior_pops: bool,
}

pub struct CompatibilityScorer {
    config: Arc<MatchingConfig>,
    prompts: PromptSimilarityChain,
    predictor: Arc<dyn Predictor>,
    cache: Arc<dyn ScoreCache>,
}

impl CompatibilityScorer {
    pub fn new(
        config: Arc<MatchingConfig>,
        prompts: PromptSimilarityChain,
        predictor: Arc<dyn Predictor>,
        cache: Arc<dyn ScoreCache>,
    ) -> Self {
        Self {
            config,
            prompts,
            predictor,
            cache,
        }
    }

    /// Score a pair and upsert the cached row.
    ///
    /// Fails only for a self-pair. A cache write failure is logged and the
    /// computed score is still returned.
    pub async fn score(
        &self,
        a: &Candidate,
        b: &Candidate,
        context: PairContext,
    ) -> Result<CompatibilityScore, MatchingError> {
        let pair = UserPair::new(a.id, b.id)
            .ok_or_else(|| MatchingError::Validation("Cannot score a user against themselves".to_string()))?;

        let score = self.compute(pair, a, b, context).await;

        if let Err(e) = self.cache.upsert_score(&score).await {
            tracing::warn!(
                user_low = %pair.low(),
                user_high = %pair.high(),
                error = %e,
                "Failed to cache compatibility score"
            );
        }

        Ok(score)
    }

    /// Score assigned when a scoring task fails outright.
    pub fn fallback_score(&self, a: Uuid, b: Uuid) -> Option<CompatibilityScore> {
        let pair = UserPair::new(a, b)?;
        Some(CompatibilityScore {
            pair,
            sub_scores: SubScores {
                model_prediction: self.config.scoring.neutral_prediction,
                ..SubScores::default()
            },
            total: self.config.scoring.fallback_total,
            degraded: vec![DegradedSignal::Scoring],
            computed_at: Utc::now(),
        })
    }

    async fn compute(
        &self,
        pair: UserPair,
        a: &Candidate,
        b: &Candidate,
        context: PairContext,
    ) -> CompatibilityScore {
        let scoring = &self.config.scoring;
        let mut degraded = Vec::new();

        let prompt = self.prompts.score(&a.prompts, &b.prompts).await;
        if prompt.degraded {
            degraded.push(DegradedSignal::PromptEmbedding);
        }

        let mut sub_scores = SubScores {
            interests: signals::interest_overlap(a, b, scoring),
            prompts: prompt.score,
            engagement: signals::engagement(a, b, scoring),
            diversity: pair_diversity(a, b, &self.config.diversity),
            behavioral: signals::behavioral(a, b, context.has_prior_pops, scoring),
            model_prediction: scoring.neutral_prediction,
        };

        let features = self.feature_vector(pair, a, b, &sub_scores);
        match self.predict(&features).await {
            Ok(probability) => sub_scores.model_prediction = probability,
            Err(e) => {
                tracing::debug!(
                    user_low = %pair.low(),
                    user_high = %pair.high(),
                    error = %e,
                    "Predictor unavailable, using neutral prediction"
                );
                degraded.push(DegradedSignal::ModelPrediction);
            }
        }

        CompatibilityScore {
            pair,
            total: self.weighted_total(&sub_scores),
            sub_scores,
            degraded,
            computed_at: Utc::now(),
        }
    }

    async fn predict(&self, features: &FeatureVector) -> Result<f64, DependencyError> {
        let timeout = self.config.scoring.prediction_timeout();
        let value = tokio::time::timeout(timeout, self.predictor.predict(features))
            .await
            .map_err(|_| DependencyError::Timeout(timeout.as_millis() as u64))??;
        prediction::checked_probability(value)
    }

    fn weighted_total(&self, s: &SubScores) -> f64 {
        let w = &self.config.scoring.weights;
        let total = w.interests * s.interests
            + w.prompts * s.prompts
            + w.engagement * s.engagement
            + w.diversity * s.diversity
            + w.behavioral * s.behavioral
            + w.model * s.model_prediction * 100.0;
        total.clamp(0.0, 100.0)
    }

    /// Sides are ordered by the canonical pair so the input is symmetric.
    fn feature_vector(
        &self,
        pair: UserPair,
        a: &Candidate,
        b: &Candidate,
        s: &SubScores,
    ) -> FeatureVector {
        let (low, high) = if a.id == pair.low() { (a, b) } else { (b, a) };
        let scoring = &self.config.scoring;
        let flag = |v: bool| if v { 1.0 } else { 0.0 };

        FeatureVector([
            low.age.abs_diff(high.age) as f64,
            low.distance_km.max(high.distance_km),
            s.interests / 100.0,
            s.prompts / 100.0,
            s.engagement / 100.0,
            s.diversity / 100.0,
            s.behavioral / 100.0,
            low.engagement.profile_completion,
            high.engagement.profile_completion,
            signals::activity(low, scoring),
            signals::activity(high, scoring),
            flag(low.premium),
            flag(high.premium),
            flag(low.verified),
            flag(high.verified),
        ])
    }
}
