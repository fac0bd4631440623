use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::SessionModel;
use crate::game::{EndReason, GameOptions, GameOutcome, GameType, RenderState};
use crate::rewards::RewardResult;

/// Request payload for starting a new game session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub game_type: GameType,
    #[serde(default)]
    pub options: GameOptions,
}

#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndSessionRequest {
    #[serde(default = "default_end_reason")]
    pub reason: EndReason,
}

fn default_end_reason() -> EndReason {
    EndReason::Completed
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// What a finished session produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub outcome: GameOutcome,
    /// Only present for completed sessions
    pub rewards: Option<RewardResult>,
    pub render: RenderState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveSessionResponse {
    pub session: Option<RenderState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistoryEntry {
    pub id: String,
    pub game_type: String,
    pub state: String,
    pub score: i64,
    pub final_score: Option<i64>,
    pub final_level: Option<i32>,
    pub duration_ms: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<SessionModel> for SessionHistoryEntry {
    fn from(model: SessionModel) -> Self {
        Self {
            id: model.id,
            game_type: model.game_type,
            state: model.state,
            score: model.score,
            final_score: model.final_score,
            final_level: model.final_level,
            duration_ms: model.duration_ms,
            started_at: model.started_at,
            ended_at: model.ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_reason_defaults_to_completed() {
        let request: EndSessionRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.reason, EndReason::Completed);

        let request: EndSessionRequest =
            serde_json::from_str(r#"{"reason": "abandoned"}"#).unwrap();
        assert_eq!(request.reason, EndReason::Abandoned);

        assert!(serde_json::from_str::<EndSessionRequest>(r#"{"reason": "abandon"}"#).is_err());
        assert!(serde_json::from_str::<EndSessionRequest>(r#"{"reasn": "abandoned"}"#).is_err());
    }

    #[test]
    fn create_request_options_are_optional() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"game_type": "trivia"}"#).unwrap();
        assert_eq!(request.game_type, GameType::Trivia);
        assert_eq!(request.options, GameOptions::default());

        let request: CreateSessionRequest = serde_json::from_str(
            r#"{"game_type": "tic_tac_toe", "options": {"opponent": "U2"}}"#,
        )
        .unwrap();
        assert_eq!(request.options.opponent.as_deref(), Some("U2"));
    }
}
