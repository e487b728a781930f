//! Drops exposure events that fell out of the echo-chamber window.

use chrono::{Duration, Utc};
use persistence::repositories::ExposureRepository;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct PruneExposuresJob {
    exposures: ExposureRepository,
    history_days: i64,
}

impl PruneExposuresJob {
    pub fn new(exposures: ExposureRepository, history_days: i64) -> Self {
        Self {
            exposures,
            history_days,
        }
    }

    fn cutoff_days(&self) -> i64 {
        // one day past the history window
        self.history_days + 1
    }
}

#[async_trait::async_trait]
impl Job for PruneExposuresJob {
    fn name(&self) -> &'static str {
        "prune_exposures"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let before = Utc::now() - Duration::days(self.cutoff_days());
        let deleted = self
            .exposures
            .prune_before(before)
            .await
            .map_err(|e| format!("Failed to prune exposure events: {e}"))?;

        if deleted > 0 {
            info!(deleted, history_days = self.history_days, "Pruned exposure events");
        }
        Ok(())
    }
}
