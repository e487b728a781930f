//! Pop endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{PopRecordResponse, PopRequest, PopResponse};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_match_created, record_pop};

/// Pop a balloon.
///
/// POST /api/v1/pops
///
/// 429 `allocation_exceeded` when the daily quota is spent; 409
/// `already_popped` with the existing record when the pair is already DOUBLE.
pub async fn pop_balloon(
    State(state): State<AppState>,
    Json(request): Json<PopRequest>,
) -> Result<Json<PopResponse>, ApiError> {
    let result = state
        .pops
        .pop_balloon(request.actor_id, request.target_id, request.pop_type)
        .await;

    match result {
        Ok(outcome) => {
            record_pop(request.pop_type, "ok");
            if outcome.match_created {
                record_match_created();
            }
            Ok(Json(outcome.into()))
        }
        Err(e) => {
            record_pop(request.pop_type, e.code());
            Err(e.into())
        }
    }
}

/// Current pop record of an ordered pair.
///
/// GET /api/v1/pops/:actor_id/:target_id
pub async fn get_pop(
    State(state): State<AppState>,
    Path((actor_id, target_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PopRecordResponse>, ApiError> {
    let record = state.pops.find_pop(actor_id, target_id).await?;
    Ok(Json(record.into()))
}
