//! Admin chat assistant

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;
use beeri_core::FieldRule;
use serde::Deserialize;
use tracing::instrument;

use crate::http::envelope::{ok, ApiResult};
use crate::http::extractors::{AdminSession, ValidJson};
use crate::http::server::AppState;
use crate::models::{Validate, ValidationErrors};
use crate::services::assistant::{ChatMessage, ChatRole};
use crate::services::{AssistantError, AssistantReply};

/// Longer histories are accepted but only the tail is forwarded.
const MAX_HISTORY: usize = 100;
const MAX_CONTENT: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub messages: Vec<ChatMessage>,
}

impl Validate for AssistantRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self.messages.last() {
            None => errors.push("messages", FieldRule::Required),
            Some(last) if last.role != ChatRole::User => {
                errors.push("messages", FieldRule::InvalidFormat)
            }
            Some(_) if self.messages.len() > MAX_HISTORY => errors.push(
                "messages",
                FieldRule::OutOfRange {
                    min: 1,
                    max: MAX_HISTORY as i64,
                },
            ),
            Some(_) => {}
        }
        if self.messages.iter().any(|m| m.content.trim().is_empty()) {
            errors.push("messages.content", FieldRule::Required);
        } else if self
            .messages
            .iter()
            .any(|m| m.content.chars().count() > MAX_CONTENT)
        {
            errors.push("messages.content", FieldRule::TooLong { max: MAX_CONTENT });
        }
        errors.finish()
    }
}

/// POST /api/assistant
#[instrument(skip_all)]
async fn ask(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<AssistantRequest>,
) -> ApiResult<AssistantReply> {
    let client = state
        .assistant
        .as_ref()
        .ok_or(AssistantError::MissingApiKey)?;
    let reply = client.ask(&input.messages).await?;
    tracing::info!(
        turns = input.messages.len(),
        action = matches!(reply, AssistantReply::Action { .. }),
        "assistant answered"
    );
    Ok(ok(reply))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/assistant", post(ask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::post_json;
    use axum::http::StatusCode;
    use serde_json::json;

    fn request(messages: serde_json::Value) -> AssistantRequest {
        serde_json::from_value(json!({ "messages": messages })).unwrap()
    }

    #[test]
    fn conversation_must_end_with_user_turn() {
        let req = request(json!([
            {"role": "user", "content": "תוסיף אירוע"},
            {"role": "assistant", "content": "לאיזה תאריך?"}
        ]));
        assert_eq!(req.validate().unwrap_err().errors()[0].field, "messages");
    }

    #[test]
    fn empty_conversation_is_rejected() {
        assert!(request(json!([])).validate().is_err());
    }

    #[test]
    fn blank_turn_is_rejected() {
        let req = request(json!([{"role": "user", "content": "   "}]));
        assert_eq!(
            req.validate().unwrap_err().errors()[0].field,
            "messages.content"
        );
    }

    #[tokio::test]
    async fn requires_admin() {
        let (status, _) = post_json(
            "/api/assistant",
            r#"{"messages":[{"role":"user","content":"שלום"}]}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_api_key_is_502_in_hebrew() {
        let (status, body) = post_json(
            "/api/assistant",
            r#"{"messages":[{"role":"user","content":"שלום"}]}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "העוזר החכם אינו זמין כרגע");
    }

    #[tokio::test]
    async fn unknown_role_is_invalid_json() {
        let (status, body) = post_json(
            "/api/assistant",
            r#"{"messages":[{"role":"system","content":"x"}]}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }
}
