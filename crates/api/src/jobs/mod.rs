//! Background jobs.

mod pool_metrics;
mod prune_exposures;
mod scheduler;

pub use pool_metrics::PoolMetricsJob;
pub use prune_exposures::PruneExposuresJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
