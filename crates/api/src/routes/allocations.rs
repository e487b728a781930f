//! Allocation endpoint handler.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::AllocationResponse;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Today's (UTC) pop allocation of a user.
///
/// GET /api/v1/allocations/:user_id
pub async fn get_allocation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let today = state.allocations.today();
    let window = state.allocations.check_allocation(user_id, today).await?;
    Ok(Json(window.into()))
}
