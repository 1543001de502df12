//! HTTP API tests over the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // for `oneshot`

use ob_server::api::{AppState, create_router};
use openbracket::{
    BracketEngine, DEFAULT_LOCK_TIMEOUT, RosterManager, TournamentLocks, store::MemoryStore,
};

fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(TournamentLocks::new(DEFAULT_LOCK_TIMEOUT));
    let state = AppState {
        engine: Arc::new(BracketEngine::new(store.clone()).with_locks(locks.clone())),
        roster: Arc::new(RosterManager::new(store).with_locks(locks)),
        pool: None,
    };
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Create a tournament, open registration and join `entrants` teams.
/// Returns the tournament id and the participant ids in seed order.
async fn seeded_tournament(app: &Router, format: &str, entrants: usize) -> (String, Vec<String>) {
    let (status, tournament) = send(
        app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({
            "name": "API Cup",
            "game": "CS2",
            "format": format,
            "team_size": "5x5",
            "max_participants": 32,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = tournament["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        "POST",
        &format!("/api/v1/tournaments/{id}/registration"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mut participants = Vec::new();
    for i in 1..=entrants {
        let (status, participant) = send(
            app,
            "POST",
            &format!("/api/v1/tournaments/{id}/join"),
            Some(json!({
                "kind": "team",
                "id": uuid::Uuid::new_v4(),
                "display_name": format!("team{i}"),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        participants.push(participant["id"].as_str().unwrap().to_string());
    }
    (id, participants)
}

fn round1_matches(bracket: &Value) -> Vec<Value> {
    bracket["rounds"][0]["matches"]
        .as_array()
        .unwrap()
        .clone()
}

#[tokio::test]
async fn health_check_reports_memory_backend() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn full_tournament_flow_over_http() {
    let app = test_app();
    let (id, participants) = seeded_tournament(&app, "single_elimination", 5).await;

    let (status, bracket) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bracket["version"], 1);
    assert_eq!(bracket["rounds"].as_array().unwrap().len(), 3);

    // Round 1: three byes for the top seeds, one playable match of 4 vs 5.
    let round1 = round1_matches(&bracket);
    assert_eq!(round1.len(), 4);
    let scheduled: Vec<&Value> = round1
        .iter()
        .filter(|m| m["status"] == "scheduled")
        .collect();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(
        scheduled[0]["participant1_id"].as_str().unwrap(),
        participants[3]
    );
    assert_eq!(
        scheduled[0]["participant2_id"].as_str().unwrap(),
        participants[4]
    );

    // Record the opener.
    let match_id = scheduled[0]["id"].as_str().unwrap();
    let (status, result) = send(
        &app,
        "PUT",
        &format!("/api/v1/matches/{match_id}/result"),
        Some(json!({"score1": 16, "score2": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["match"]["winner_id"].as_str().unwrap(), participants[3]);
    assert_eq!(result["bracket_version"], 2);
    assert_eq!(result["tournament_complete"], false);

    let (status, tournament) = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tournament["status"], "in_progress");

    // The bracket endpoint shows the winner advanced into round 2.
    let (status, bracket) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/bracket"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let semi = &bracket["rounds"][1]["matches"][0];
    assert_eq!(semi["participant2_id"].as_str().unwrap(), participants[3]);
    assert_eq!(semi["status"], "scheduled");
}

#[tokio::test]
async fn legacy_routes_still_serve() {
    let app = test_app();
    let (id, _) = seeded_tournament(&app, "single_elimination", 4).await;

    let (status, bracket) = send(
        &app,
        "POST",
        &format!("/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = send(&app, "GET", &format!("/tournaments/{id}/bracket"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["version"], bracket["version"]);

    let match_id = round1_matches(&fetched)[0]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/matches/{match_id}/result"),
        Some(json!({"score1": 2, "score2": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn error_mapping_matches_the_taxonomy() {
    let app = test_app();

    // Unknown tournament: 404.
    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{missing}/bracket"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));

    // Generating from draft: 409.
    let (_, tournament) = send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({
            "name": "Draft Cup",
            "format": "round_robin",
            "team_size": "1x1",
            "max_participants": 8,
        })),
    )
    .await;
    let id = tournament["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Too few participants: 400.
    send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/registration"),
        None,
    )
    .await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("insufficient"));

    // Unknown match: 404.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/v1/matches/{missing}/result"),
        Some(json!({"score1": 1, "score2": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn drawn_scores_rejected_in_elimination() {
    let app = test_app();
    let (id, _) = seeded_tournament(&app, "single_elimination", 4).await;
    let (_, bracket) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;

    let match_id = round1_matches(&bracket)[0]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/matches/{match_id}/result"),
        Some(json!({"score1": 1, "score2": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("scores must differ"));
}

#[tokio::test]
async fn join_and_leave_manage_the_roster() {
    let app = test_app();
    let (id, participants) = seeded_tournament(&app, "round_robin", 3).await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/leave"),
        Some(json!({"participant_id": participants[0]})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, detail) = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let remaining = detail["participants"].as_array().unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0]["seed"], 1);
    assert_eq!(remaining[1]["seed"], 2);

    // Leaving twice: 404.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/tournaments/{id}/leave"),
        Some(json!({"participant_id": participants[0]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tournaments_can_be_updated_and_deleted() {
    let app = test_app();
    let (id, _) = seeded_tournament(&app, "single_elimination", 2).await;

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/v1/tournaments/{id}"),
        Some(json!({"name": "Renamed Cup", "prize_pool": "$500"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed Cup");
    assert_eq!(updated["prize_pool"], "$500");
    assert_eq!(updated["game"], "CS2");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/tournaments/{id}/bracket/generate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Edits stop once the bracket locks.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/tournaments/{id}"),
        Some(json!({"name": "Too Late Cup"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("no longer editable"));

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/v1/tournaments/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/tournaments/{id}/bracket"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = test_app();
    let (id, _) = seeded_tournament(&app, "round_robin", 2).await;
    // A second tournament left in draft.
    send(
        &app,
        "POST",
        "/api/v1/tournaments",
        Some(json!({
            "name": "Sleeping Cup",
            "format": "single_elimination",
            "team_size": "1x1",
            "max_participants": 8,
        })),
    )
    .await;

    let (status, listed) = send(&app, "GET", "/api/v1/tournaments?status=registration", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), id);

    let (_, all) = send(&app, "GET", "/api/v1/tournaments", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn responses_carry_request_ids() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "test-trace-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "test-trace-1"
    );
}
