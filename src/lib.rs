// Library crate for the community arcade server
// This file exposes the public API for integration tests

pub mod config;
pub mod game;
pub mod players;
pub mod rewards;
pub mod session;
pub mod shared;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use config::{AppConfig, ConfigError};
pub use game::{new_instance, GameInstance, GameState, GameType};
pub use rewards::{RewardCalculator, RewardConfig};
pub use session::{SessionError, SessionRegistry};
pub use shared::{AppError, AppState, StoreError};

/// All HTTP routes of the session API
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/players/:player_id/sessions", post(session::create_session))
        .route(
            "/players/:player_id/sessions/active",
            get(session::get_active_session),
        )
        .route(
            "/players/:player_id/sessions/history",
            get(session::session_history),
        )
        .route("/sessions/:id/input", post(session::process_input))
        .route("/sessions/:id/join", post(session::join_session))
        .route("/sessions/:id/pause", post(session::pause_session))
        .route("/sessions/:id/resume", post(session::resume_session))
        .route("/sessions/:id/end", post(session::end_session))
        .route("/sessions/:id/abandon", post(session::abandon_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
