//! HTTP API for the tournament server.
//!
//! Built with Axum and Tower. Handlers delegate to the library's
//! [`BracketEngine`] and [`RosterManager`]; this layer only translates
//! between HTTP and the engine's error taxonomy.
//!
//! # Endpoints
//!
//! ## API v1
//! ```text
//! GET  /health                                    - Health check
//! GET  /api/v1/tournaments                        - List tournaments
//! POST /api/v1/tournaments                        - Create tournament
//! GET  /api/v1/tournaments/{id}                   - Get tournament
//! PUT  /api/v1/tournaments/{id}                   - Update tournament
//! DELETE /api/v1/tournaments/{id}                 - Delete tournament
//! POST /api/v1/tournaments/{id}/registration      - Open registration
//! POST /api/v1/tournaments/{id}/cancel            - Cancel tournament
//! POST /api/v1/tournaments/{id}/join              - Register an entrant
//! DELETE /api/v1/tournaments/{id}/leave           - Withdraw an entrant
//! GET  /api/v1/tournaments/{id}/bracket           - Get current bracket
//! POST /api/v1/tournaments/{id}/bracket/generate  - Generate bracket
//! POST /api/v1/tournaments/{id}/bracket/regenerate- Regenerate bracket
//! PUT  /api/v1/matches/{id}/result                - Record a match result
//! ```
//!
//! ## Legacy routes (unversioned, kept for older clients)
//! ```text
//! POST /tournaments/{id}/bracket/generate
//! GET  /tournaments/{id}/bracket
//! PUT  /matches/{id}/result
//! POST /tournaments/{id}/join
//! DELETE /tournaments/{id}/leave
//! ```

pub mod matches;
pub mod request_id;
pub mod tournaments;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use openbracket::{BracketEngine, BracketError, RosterError, RosterManager};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers. Cloning is cheap; everything
/// interesting sits behind an Arc.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BracketEngine>,
    pub roster: Arc<RosterManager>,
    /// Present only when backed by PostgreSQL; used by the health check.
    pub pool: Option<PgPool>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn bracket_error(err: BracketError) -> ApiError {
    let status = match &err {
        BracketError::TournamentNotFound(_)
        | BracketError::MatchNotFound(_)
        | BracketError::BracketNotFound(_) => StatusCode::NOT_FOUND,
        BracketError::InvalidState { .. } | BracketError::BracketAlreadyStarted => {
            StatusCode::CONFLICT
        }
        BracketError::MatchNotReady
        | BracketError::AmbiguousResult
        | BracketError::InsufficientParticipants { .. } => StatusCode::BAD_REQUEST,
        BracketError::ConcurrencyTimeout(_) | BracketError::StorageUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        BracketError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("bracket operation failed: {err}");
    }
    error_body(status, err.to_string())
}

pub(crate) fn roster_error(err: RosterError) -> ApiError {
    let status = match &err {
        RosterError::TournamentNotFound(_) | RosterError::NotRegistered => StatusCode::NOT_FOUND,
        RosterError::RegistrationClosed(_)
        | RosterError::InvalidTransition { .. }
        | RosterError::TournamentFull { .. }
        | RosterError::AlreadyRegistered => StatusCode::CONFLICT,
        RosterError::NotEditable(_) => StatusCode::CONFLICT,
        RosterError::CapacityTooSmall => StatusCode::BAD_REQUEST,
        RosterError::ConcurrencyTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        RosterError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("roster operation failed: {err}");
    }
    error_body(status, err.to_string())
}

/// Build the full router: versioned API, legacy aliases, health check,
/// request IDs and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        // Legacy unversioned routes.
        .route(
            "/tournaments/{id}/bracket/generate",
            post(tournaments::generate_bracket),
        )
        .route("/tournaments/{id}/bracket", get(tournaments::get_bracket))
        .route("/tournaments/{id}/join", post(tournaments::join))
        .route("/tournaments/{id}/leave", delete(tournaments::leave))
        .route("/matches/{id}/result", put(matches::record_result))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/tournaments",
            get(tournaments::list).post(tournaments::create),
        )
        .route(
            "/tournaments/{id}",
            get(tournaments::get)
                .put(tournaments::update)
                .delete(tournaments::remove),
        )
        .route(
            "/tournaments/{id}/registration",
            post(tournaments::open_registration),
        )
        .route("/tournaments/{id}/cancel", post(tournaments::cancel))
        .route("/tournaments/{id}/join", post(tournaments::join))
        .route("/tournaments/{id}/leave", delete(tournaments::leave))
        .route("/tournaments/{id}/bracket", get(tournaments::get_bracket))
        .route(
            "/tournaments/{id}/bracket/generate",
            post(tournaments::generate_bracket),
        )
        .route(
            "/tournaments/{id}/bracket/regenerate",
            post(tournaments::regenerate_bracket),
        )
        .route("/matches/{id}/result", put(matches::record_result))
}

/// Health check for monitors and load balancers. Reports the storage
/// backend and pings the database when one is configured.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (backend, db_healthy) = match &state.pool {
        Some(pool) => (
            "postgres",
            sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        ),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": backend,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    (status_code, Json(response))
}
