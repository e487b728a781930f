//! Match lookup handler.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{MatchResponse, UserPair};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Match of an unordered pair; argument order does not matter.
///
/// GET /api/v1/matches/:user_a/:user_b
pub async fn get_match(
    State(state): State<AppState>,
    Path((user_a, user_b)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchResponse>, ApiError> {
    let pair = UserPair::new(user_a, user_b).ok_or_else(|| {
        ApiError::Validation("A user cannot match with themselves".to_string(), Vec::new())
    })?;

    let found = state.matches.find_match(pair).await?;
    found
        .map(|m| Json(m.into()))
        .ok_or_else(|| ApiError::NotFound(format!("No match between {user_a} and {user_b}")))
}
