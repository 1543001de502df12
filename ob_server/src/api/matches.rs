//! Match result API handlers.
//!
//! Record a result:
//! ```bash
//! curl -X PUT http://localhost:3000/api/v1/matches/<id>/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"score1": 16, "score2": 9}'
//! ```

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openbracket::BracketError;
use openbracket::engine::models::{Match, Score};

use super::{ApiError, AppState, bracket_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub score1: Score,
    pub score2: Score,
}

#[derive(Debug, Serialize)]
pub struct RecordResultResponse {
    #[serde(rename = "match")]
    pub played: Match,
    pub bracket_version: u64,
    pub tournament_complete: bool,
}

pub async fn record_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordResultRequest>,
) -> Result<Json<RecordResultResponse>, ApiError> {
    let bracket = state
        .engine
        .record_result(id, request.score1, request.score2)
        .await
        .map_err(bracket_error)?;

    metrics::match_results_total(bracket.format.as_str());

    let played = bracket
        .find_match(id)
        .cloned()
        .ok_or_else(|| bracket_error(BracketError::MatchNotFound(id)))?;
    Ok(Json(RecordResultResponse {
        played,
        bracket_version: bracket.version,
        tournament_complete: bracket.is_complete(),
    }))
}
