//! Tournament lifecycle and bracket API handlers.
//!
//! Create a tournament:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Cup", "format": "single_elimination", "team_size": "5x5", "max_participants": 16}'
//! ```
//!
//! Generate its bracket once registration is done:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/tournaments/<id>/bracket/generate
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openbracket::{NewTournament, UpdateTournament};
use openbracket::engine::models::{
    Bracket, Participant, ParticipantRef, TeamSize, Tournament, TournamentFormat,
    TournamentStatus,
};

use super::{ApiError, AppState, bracket_error, roster_error};
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub description: Option<String>,
    pub game: Option<String>,
    pub format: TournamentFormat,
    pub team_size: TeamSize,
    pub max_participants: u32,
    #[serde(default)]
    pub allow_draws: bool,
    pub prize_pool: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTournamentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub game: Option<String>,
    pub format: Option<TournamentFormat>,
    pub team_size: Option<TeamSize>,
    pub max_participants: Option<u32>,
    pub allow_draws: Option<bool>,
    pub prize_pool: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<TournamentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    #[serde(flatten)]
    pub entrant: ParticipantRef,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub participant_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TournamentDetail {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub participants: Vec<Participant>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Tournament>>, ApiError> {
    let tournaments = state.roster.list(query.status).await.map_err(roster_error)?;
    Ok(Json(tournaments))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let tournament = state
        .roster
        .create_tournament(NewTournament {
            name: request.name,
            description: request.description,
            game: request.game,
            format: request.format,
            team_size: request.team_size,
            max_participants: request.max_participants,
            allow_draws: request.allow_draws,
            prize_pool: request.prize_pool,
        })
        .await
        .map_err(roster_error)?;
    Ok((StatusCode::CREATED, Json(tournament)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TournamentDetail>, ApiError> {
    let tournament = state.roster.get(id).await.map_err(roster_error)?;
    let participants = state.roster.participants(id).await.map_err(roster_error)?;
    Ok(Json(TournamentDetail {
        tournament,
        participants,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTournamentRequest>,
) -> Result<Json<Tournament>, ApiError> {
    let tournament = state
        .roster
        .update_tournament(
            id,
            UpdateTournament {
                name: request.name,
                description: request.description,
                game: request.game,
                format: request.format,
                team_size: request.team_size,
                max_participants: request.max_participants,
                allow_draws: request.allow_draws,
                prize_pool: request.prize_pool,
            },
        )
        .await
        .map_err(roster_error)?;
    Ok(Json(tournament))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.roster.delete(id).await.map_err(roster_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn open_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tournament>, ApiError> {
    let tournament = state
        .roster
        .open_registration(id)
        .await
        .map_err(roster_error)?;
    Ok(Json(tournament))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tournament>, ApiError> {
    let tournament = state.roster.cancel(id).await.map_err(roster_error)?;
    Ok(Json(tournament))
}

pub async fn join(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JoinRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let participant = state
        .roster
        .join(id, request.entrant, request.display_name)
        .await
        .map_err(roster_error)?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn leave(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LeaveRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .roster
        .leave(id, request.participant_id)
        .await
        .map_err(roster_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_bracket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Bracket>, ApiError> {
    let bracket = state.engine.get_bracket(id).await.map_err(bracket_error)?;
    Ok(Json(bracket))
}

pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Bracket>), ApiError> {
    let bracket = state.engine.generate(id).await.map_err(bracket_error)?;
    metrics::brackets_generated_total(bracket.format.as_str());
    Ok((StatusCode::CREATED, Json(bracket)))
}

pub async fn regenerate_bracket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Bracket>, ApiError> {
    let bracket = state.engine.regenerate(id).await.map_err(bracket_error)?;
    metrics::brackets_generated_total(bracket.format.as_str());
    Ok(Json(bracket))
}
