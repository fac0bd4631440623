use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{
    ActiveSessionResponse, CreateSessionRequest, EndSessionRequest, HistoryQuery,
    JoinSessionRequest, SessionHistoryEntry, SessionSummary,
};
use super::SessionError;
use crate::game::{new_instance, EndReason, GameInput, RenderState};
use crate::shared::{AppError, AppState};

const DEFAULT_HISTORY_LIMIT: usize = 10;
const MAX_HISTORY_LIMIT: usize = 100;

/// POST /players/:player_id/sessions
#[instrument(name = "create_session", skip(state, request))]
pub async fn create_session(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<RenderState>, AppError> {
    info!(game_type = %request.game_type, "Starting new game session");

    let instance = new_instance(request.game_type, &player_id, &request.options)
        .map_err(SessionError::from)?;
    let render = state.registry.create_session(instance).await?;

    Ok(Json(render))
}

/// GET /players/:player_id/sessions/active
#[instrument(name = "get_active_session", skip(state))]
pub async fn get_active_session(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<ActiveSessionResponse>, AppError> {
    let session = state.registry.get_active_session(&player_id).await?;
    Ok(Json(ActiveSessionResponse { session }))
}

/// GET /players/:player_id/sessions/history
#[instrument(name = "session_history", skip(state))]
pub async fn session_history(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SessionHistoryEntry>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be positive".to_string()));
    }

    let history = state.registry.player_history(&player_id, limit).await?;
    Ok(Json(history.into_iter().map(Into::into).collect()))
}

/// POST /sessions/:id/input
#[instrument(name = "process_input", skip(state, input))]
pub async fn process_input(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(input): Json<GameInput>,
) -> Result<Json<RenderState>, AppError> {
    let render = state.registry.process_input(&session_id, &input).await?;
    Ok(Json(render))
}

/// POST /sessions/:id/join
#[instrument(name = "join_session", skip(state, request))]
pub async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<JoinSessionRequest>,
) -> Result<Json<RenderState>, AppError> {
    let render = state
        .registry
        .join_session(&session_id, &request.player_id)
        .await?;
    Ok(Json(render))
}

/// POST /sessions/:id/pause
#[instrument(name = "pause_session", skip(state))]
pub async fn pause_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<RenderState>, AppError> {
    Ok(Json(state.registry.pause_session(&session_id).await?))
}

/// POST /sessions/:id/resume
#[instrument(name = "resume_session", skip(state))]
pub async fn resume_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<RenderState>, AppError> {
    Ok(Json(state.registry.resume_session(&session_id).await?))
}

/// POST /sessions/:id/end
///
/// An empty body completes the session; a non-empty one must be a valid
/// `EndSessionRequest`, whatever its content type.
#[instrument(name = "end_session", skip(state, body))]
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<SessionSummary>, AppError> {
    let reason = end_reason(&body)?;

    let summary = state.registry.end_session(&session_id, reason).await?;
    info!(
        reason = %reason,
        score = summary.outcome.score,
        "Session ended via API"
    );
    Ok(Json(summary))
}

fn end_reason(body: &[u8]) -> Result<EndReason, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EndReason::Completed);
    }
    serde_json::from_slice::<EndSessionRequest>(body)
        .map(|request| request.reason)
        .map_err(|e| AppError::BadRequest(format!("Invalid end request: {}", e)))
}

/// POST /sessions/:id/abandon
#[instrument(name = "abandon_session", skip(state))]
pub async fn abandon_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(state.registry.abandon_session(&session_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::shared::test_utils::{AppStateBuilder, FailingLedger, RecordingLedger};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/players/:player_id/sessions", post(create_session))
            .route(
                "/players/:player_id/sessions/active",
                get(get_active_session),
            )
            .route(
                "/players/:player_id/sessions/history",
                get(session_history),
            )
            .route("/sessions/:id/input", post(process_input))
            .route("/sessions/:id/pause", post(pause_session))
            .route("/sessions/:id/resume", post(resume_session))
            .route("/sessions/:id/end", post(end_session))
            .with_state(state)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn finished_tic_tac_toe(state: &AppState) -> RenderState {
        let render = state
            .registry
            .create_session(
                new_instance(crate::game::GameType::TicTacToe, "U1", &Default::default())
                    .unwrap(),
            )
            .await
            .unwrap();
        for cell in [0, 8, 6, 3] {
            let input = GameInput::Place {
                cell,
                player_id: None,
            };
            state
                .registry
                .process_input(&render.session_id, &input)
                .await
                .unwrap();
        }
        render
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_session_handler() {
        let app = app(AppStateBuilder::new().build());

        let response = app
            .oneshot(json_request(
                "POST",
                "/players/U1/sessions",
                r#"{"game_type": "tic_tac_toe"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let render: RenderState =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(render.player_id, "U1");
        assert_eq!(render.state, GameState::Playing);
        assert!(!render.session_id.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_session_is_conflict() {
        let state = AppStateBuilder::new().build();
        let body = r#"{"game_type": "trivia"}"#;

        let first = app(state.clone())
            .oneshot(json_request("POST", "/players/U1/sessions", body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app(state)
            .oneshot(json_request("POST", "/players/U1/sessions", body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let json = body_json(second).await;
        assert!(json["error"].as_str().unwrap().contains("already"));
    }

    #[tokio::test]
    async fn test_illegal_move_is_unprocessable() {
        let state = AppStateBuilder::new().build();
        let render = state
            .registry
            .create_session(
                new_instance(
                    crate::game::GameType::TicTacToe,
                    "U1",
                    &Default::default(),
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let response = app(state)
            .oneshot(json_request(
                "POST",
                &format!("/sessions/{}/input", render.session_id),
                r#"{"action": "place", "cell": 42}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let response = app(AppStateBuilder::new().build())
            .oneshot(json_request("POST", "/sessions/nope/pause", ""))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reward_failure_reports_delayed_rewards() {
        let state = AppStateBuilder::new()
            .with_ledger(Arc::new(FailingLedger))
            .build();
        let render = finished_tic_tac_toe(&state).await;

        let response = app(state.clone())
            .oneshot(json_request(
                "POST",
                &format!("/sessions/{}/end", render.session_id),
                "{}",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("rewards may be delayed"));
        assert_eq!(json["outcome"]["session_id"], render.session_id);
        assert_eq!(state.registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_end_reason_is_honoured_without_content_type() {
        let ledger = Arc::new(RecordingLedger::default());
        let state = AppStateBuilder::new().with_ledger(ledger.clone()).build();
        let render = finished_tic_tac_toe(&state).await;

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/sessions/{}/end", render.session_id))
                    .body(Body::from(r#"{"reason": "abandoned"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["render"]["state"], "abandoned");
        assert!(json["rewards"].is_null());
        assert!(ledger.credits().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_end_body_is_bad_request() {
        let ledger = Arc::new(RecordingLedger::default());
        let state = AppStateBuilder::new().with_ledger(ledger.clone()).build();
        let render = finished_tic_tac_toe(&state).await;

        for body in [r#"{"reason": "abandon"}"#, "not json", r#"{"reasn": "abandoned"}"#] {
            let response = app(state.clone())
                .oneshot(json_request(
                    "POST",
                    &format!("/sessions/{}/end", render.session_id),
                    body,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        assert!(ledger.credits().is_empty());
        assert_eq!(state.registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_end_body_completes() {
        let ledger = Arc::new(RecordingLedger::default());
        let state = AppStateBuilder::new().with_ledger(ledger.clone()).build();
        let render = finished_tic_tac_toe(&state).await;

        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/sessions/{}/end", render.session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["render"]["state"], "completed");
        assert_eq!(ledger.credits().len(), 1);
    }

    #[tokio::test]
    async fn test_active_and_history_endpoints() {
        let state = AppStateBuilder::new().build();

        let response = app(state.clone())
            .oneshot(
                Request::builder()
                    .uri("/players/U1/sessions/active")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["session"].is_null());

        let render = state
            .registry
            .create_session(
                new_instance(crate::game::GameType::Trivia, "U1", &Default::default()).unwrap(),
            )
            .await
            .unwrap();
        state
            .registry
            .abandon_session(&render.session_id)
            .await
            .unwrap();

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/players/U1/sessions/history?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history: Vec<SessionHistoryEntry> =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state, "abandoned");
    }
}
