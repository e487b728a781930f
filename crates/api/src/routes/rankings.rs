//! Ranking endpoint handler.

use axum::{extract::State, Json};
use domain::models::{RankingRequest, RankingResponse};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_degraded_signal, record_ranking_served};

/// Score, rebalance and dampen the supplied candidate pool for its viewer.
///
/// POST /api/v1/rankings
pub async fn rank_candidates(
    State(state): State<AppState>,
    Json(request): Json<RankingRequest>,
) -> Result<Json<RankingResponse>, ApiError> {
    request.validate()?;

    let viewer_id = request.viewer.id;
    let response = state.rankings.rank(request).await?;

    for signal in response.rankings.iter().flat_map(|r| r.degraded.iter()) {
        record_degraded_signal(*signal);
    }
    record_ranking_served(response.total);

    tracing::info!(viewer_id = %viewer_id, returned = response.total, "Rankings served");
    Ok(Json(response))
}
