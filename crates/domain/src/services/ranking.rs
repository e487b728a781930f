//! Ranking flow: score every candidate, rebalance, dampen, record exposures.

use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::config::MatchingConfig;
use crate::errors::MatchingError;
use crate::models::{
    Candidate, CompatibilityScore, ExposureBucket, RankedCandidate, RankingRequest,
    RankingResponse, ScoredCandidate,
};
use crate::services::allocation::Clock;
use crate::services::diversity::DiversityBalancer;
use crate::services::scoring::{CompatibilityScorer, PairContext};
use crate::store::{ExposureStore, PopStore};

pub struct RankingService {
    config: Arc<MatchingConfig>,
    scorer: Arc<CompatibilityScorer>,
    balancer: DiversityBalancer,
    pops: Arc<dyn PopStore>,
    exposures: Arc<dyn ExposureStore>,
    clock: Arc<dyn Clock>,
}

impl RankingService {
    pub fn new(
        config: Arc<MatchingConfig>,
        scorer: Arc<CompatibilityScorer>,
        pops: Arc<dyn PopStore>,
        exposures: Arc<dyn ExposureStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            balancer: DiversityBalancer::new(config.clone()),
            config,
            scorer,
            pops,
            exposures,
            clock,
        }
    }

    /// Rank the request's candidate pool for its viewer.
    pub async fn rank(&self, request: RankingRequest) -> Result<RankingResponse, MatchingError> {
        let max_limit = self.config.ranking.max_limit;
        let limit = match request.limit {
            Some(limit) if limit > max_limit => {
                return Err(MatchingError::Validation(format!(
                    "limit must be between 1 and {max_limit}"
                )));
            }
            Some(limit) => limit.max(1),
            None => self.config.ranking.default_limit,
        };
        let viewer = Arc::new(request.viewer);

        let mut seen = HashSet::new();
        let pool: Vec<Candidate> = request
            .candidates
            .into_iter()
            .filter(|c| c.id != viewer.id && seen.insert(c.id))
            .collect();

        let partners = self.pops.interaction_partners(viewer.id).await?;
        let now = self.clock.now();
        let since = now - Duration::days(self.config.echo_chamber.history_days);
        let history = self.exposures.exposure_history(viewer.id, since).await?;

        let scored = self.score_all(&viewer, pool, &partners).await;
        let ranked = self.balancer.balance(&viewer, scored, &history, limit);

        let shown: Vec<_> = ranked
            .iter()
            .map(|c| (c.id(), ExposureBucket::for_candidate(&c.candidate)))
            .collect();
        if let Err(e) = self.exposures.record_exposures(viewer.id, &shown, now).await {
            tracing::warn!(viewer_id = %viewer.id, error = %e, "Failed to record exposures");
        }

        tracing::debug!(
            viewer_id = %viewer.id,
            returned = ranked.len(),
            limit,
            "Ranking computed"
        );

        let rankings: Vec<RankedCandidate> = ranked.into_iter().map(RankedCandidate::from).collect();
        Ok(RankingResponse {
            total: rankings.len(),
            rankings,
        })
    }

    /// Score candidates concurrently within the batch deadline; a failed or
    /// unfinished task gets the fallback score.
    async fn score_all(
        &self,
        viewer: &Arc<Candidate>,
        pool: Vec<Candidate>,
        partners: &HashSet<uuid::Uuid>,
    ) -> Vec<ScoredCandidate> {
        let mut results: Vec<Option<CompatibilityScore>> = vec![None; pool.len()];
        let mut tasks = JoinSet::new();

        for (index, candidate) in pool.iter().enumerate() {
            let scorer = self.scorer.clone();
            let viewer = viewer.clone();
            let candidate = candidate.clone();
            let context = PairContext {
                has_prior_pops: partners.contains(&candidate.id),
            };
            tasks.spawn(async move {
                (index, scorer.score(&viewer, &candidate, context).await)
            });
        }

        let deadline = tokio::time::Instant::now() + self.config.scoring.batch_deadline();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, Ok(score))))) => results[index] = Some(score),
                Ok(Some(Ok((index, Err(e))))) => {
                    tracing::warn!(candidate_index = index, error = %e, "Scoring failed");
                }
                Ok(Some(Err(e))) => {
                    tracing::error!(error = %e, "Scoring task aborted");
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        viewer_id = %viewer.id,
                        unfinished = tasks.len(),
                        "Scoring deadline reached, using fallback scores"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        pool.into_iter()
            .zip(results)
            .filter_map(|(candidate, score)| {
                let score = score.or_else(|| self.scorer.fallback_score(viewer.id, candidate.id))?;
                Some(ScoredCandidate::new(candidate, score))
            })
            .collect()
    }
}
