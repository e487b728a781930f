//! Exposure event aggregates (database row mapping).

use domain::models::{AgeBracket, ExposureBucket};
use sqlx::FromRow;

/// Exposure count per bucket, as aggregated from exposure_events.
#[derive(Debug, Clone, FromRow)]
pub struct ExposureCountEntity {
    pub age_bracket: String,
    pub category: String,
    pub exposures: i64,
}

impl ExposureCountEntity {
    /// Bucket and count; `None` for an unknown age bracket label.
    pub fn into_bucket(self) -> Option<(ExposureBucket, u32)> {
        let age_bracket = AgeBracket::parse(&self.age_bracket)?;
        Some((
            ExposureBucket {
                age_bracket,
                category: self.category,
            },
            u32::try_from(self.exposures).unwrap_or(u32::MAX),
        ))
    }
}
