use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::session::{SessionError, SessionRegistry};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

/// Failure reported by a persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Session(SessionError::Duplicate { session_id, .. }) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "You already have a game in progress. Finish or abandon it first.",
                    "session_id": session_id,
                }),
            ),
            AppError::Session(SessionError::InvalidInput(msg)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": format!("That move isn't allowed: {}", msg) }),
            ),
            AppError::Session(SessionError::RewardApplication { outcome, source }) => {
                tracing::error!(
                    session_id = %outcome.session_id,
                    error = %source,
                    "Session completed but rewards were not applied"
                );
                (
                    StatusCode::ACCEPTED,
                    json!({
                        "error": "Game completed, but rewards may be delayed.",
                        "outcome": outcome,
                    }),
                )
            }
            AppError::Session(SessionError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Session not found: {}", id) }),
            ),
            AppError::Session(e @ SessionError::InvalidStateTransition { .. }) => {
                (StatusCode::CONFLICT, json!({ "error": e.to_string() }))
            }
            AppError::Session(e) => {
                tracing::error!(error = %e, "Session operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
