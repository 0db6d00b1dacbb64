//! LLM assistant for committee admins
//!
//! Forwards the conversation to an OpenAI-compatible chat completion
//! endpoint with three tools. A tool call is never executed here: its
//! arguments are validated and handed back to the client, which asks the
//! admin to confirm and then calls the regular API route.

use std::time::Duration;

use beeri_core::clock::{israel_to_utc, israel_today};
use chrono::{DateTime, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::directory::CreateVendor;
use crate::models::event::CreateEvent;
use crate::models::task::CreateTask;
use crate::models::{Validate, ValidationErrors};

/// Conversation turns kept per request
pub const MAX_MESSAGES: usize = 30;
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("missing api key")]
    MissingApiKey,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("rate limited")]
    RateLimited,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Response(String),
    #[error("unknown tool {0}")]
    UnknownTool(String),
    #[error("tool arguments rejected: {0}")]
    InvalidArguments(ValidationErrors),
}

/// One turn of the conversation as sent by the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// What the admin UI should do with the answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssistantReply {
    Message {
        content: String,
    },
    Action {
        action: AssistantAction,
        payload: Value,
        requires_confirmation: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantAction {
    CreateEvent,
    CreateTask,
    CreateVendor,
}

impl AssistantAction {
    fn from_tool(name: &str) -> Option<Self> {
        match name {
            "create_event" => Some(Self::CreateEvent),
            "create_task" => Some(Self::CreateTask),
            "create_vendor" => Some(Self::CreateVendor),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Value>,
    tools: Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON document encoded as a string
    arguments: String,
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AssistantClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self, AssistantError> {
        if api_key.trim().is_empty() {
            return Err(AssistantError::MissingApiKey);
        }
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("beeri-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    pub async fn ask(&self, messages: &[ChatMessage]) -> Result<AssistantReply, AssistantError> {
        let start = messages.len().saturating_sub(MAX_MESSAGES);
        let mut wire = vec![json!({ "role": "system", "content": system_prompt() })];
        wire.extend(
            messages[start..]
                .iter()
                .map(|m| json!({ "role": m.role, "content": m.content })),
        );

        let request = CompletionRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: wire,
            tools: tool_definitions(),
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = match res.status() {
            s if s.is_success() => res
                .json::<CompletionResponse>()
                .await
                .map_err(|e| AssistantError::Response(e.to_string()))?,
            StatusCode::UNAUTHORIZED => return Err(AssistantError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(AssistantError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                return Err(AssistantError::Http { status, body });
            }
        };

        interpret(response)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        AssistantError::Timeout
    } else {
        AssistantError::Transport(e.to_string())
    }
}

fn interpret(response: CompletionResponse) -> Result<AssistantReply, AssistantError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| AssistantError::Response("no choices".into()))?;

    if let Some(call) = message.tool_calls.into_iter().next() {
        return tool_reply(&call.function.name, &call.function.arguments);
    }

    Ok(AssistantReply::Message {
        content: message.content.unwrap_or_default(),
    })
}

/// Parse and validate a tool call exactly like the matching API route would.
fn tool_reply(name: &str, arguments: &str) -> Result<AssistantReply, AssistantError> {
    let action =
        AssistantAction::from_tool(name).ok_or_else(|| AssistantError::UnknownTool(name.into()))?;

    let arguments: Value =
        serde_json::from_str(arguments).map_err(|e| AssistantError::Response(e.to_string()))?;

    let payload = match action {
        AssistantAction::CreateEvent => checked::<CreateEvent>(with_event_times_in_utc(arguments))?,
        AssistantAction::CreateTask => checked::<CreateTask>(arguments)?,
        AssistantAction::CreateVendor => checked::<CreateVendor>(arguments)?,
    };

    Ok(AssistantReply::Action {
        action,
        payload,
        requires_confirmation: true,
    })
}

fn checked<T>(arguments: Value) -> Result<Value, AssistantError>
where
    T: for<'de> Deserialize<'de> + Serialize + Validate,
{
    let parsed: T =
        serde_json::from_value(arguments).map_err(|e| AssistantError::Response(e.to_string()))?;
    parsed.validate().map_err(AssistantError::InvalidArguments)?;
    serde_json::to_value(&parsed).map_err(|e| AssistantError::Response(e.to_string()))
}

/// Models often drop the offset; read such times as Israel wall-clock time.
fn with_event_times_in_utc(mut arguments: Value) -> Value {
    for field in ["start_datetime", "end_datetime"] {
        let Some(raw) = arguments.get(field).and_then(Value::as_str) else {
            continue;
        };
        if DateTime::parse_from_rfc3339(raw).is_ok() {
            continue;
        }
        let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"));
        if let Some(at) = local.ok().and_then(israel_to_utc) {
            arguments[field] = Value::String(at.to_rfc3339());
        }
    }
    arguments
}

fn system_prompt() -> String {
    format!(
        "אתה עוזר לוועד ההורים. היום {}. ענה בשפת המשתמש. \
         כשמבקשים ליצור אירוע, משימה או ספק השתמש בכלי המתאים; \
         תאריכים בפורמט ISO 8601 עם היסט מאזור הזמן Asia/Jerusalem, למשל 2026-06-20T18:00:00+03:00.",
        israel_today()
    )
}

fn tool_definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "create_event",
                "description": "Create a committee event",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "start_datetime": {
                            "type": "string",
                            "format": "date-time",
                            "description": "ISO 8601 with UTC offset, Asia/Jerusalem local time"
                        },
                        "end_datetime": {
                            "type": "string",
                            "format": "date-time",
                            "description": "ISO 8601 with UTC offset, Asia/Jerusalem local time"
                        },
                        "location": { "type": "string" },
                        "event_type": { "type": "string" },
                        "budget_allocated": { "type": "number" }
                    },
                    "required": ["title", "start_datetime"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "create_task",
                "description": "Create a task for a committee member",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "priority": { "type": "string", "enum": ["low", "normal", "high", "critical"] },
                        "due_date": { "type": "string", "format": "date" },
                        "owner_name": { "type": "string" },
                        "owner_phone": { "type": "string" }
                    },
                    "required": ["title"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "create_vendor",
                "description": "Add a vendor to the directory",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "category": { "type": "string" },
                        "contact_name": { "type": "string" },
                        "phone": { "type": "string" },
                        "email": { "type": "string" },
                        "website": { "type": "string" },
                        "notes": { "type": "string" }
                    },
                    "required": ["name"]
                }
            }
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: Value) -> CompletionResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn plain_answer_is_a_message() {
        let reply = interpret(response(json!({
            "choices": [{ "message": { "role": "assistant", "content": "שלום" } }]
        })))
        .unwrap();
        assert_eq!(
            reply,
            AssistantReply::Message {
                content: "שלום".into()
            }
        );
    }

    #[test]
    fn tool_call_becomes_confirmable_action() {
        let reply = interpret(response(json!({
            "choices": [{ "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "create_task",
                        "arguments": "{\"title\":\"להזמין בלונים\",\"priority\":\"high\"}"
                    }
                }]
            } }]
        })))
        .unwrap();

        match reply {
            AssistantReply::Action {
                action,
                payload,
                requires_confirmation,
            } => {
                assert_eq!(action, AssistantAction::CreateTask);
                assert_eq!(payload["title"], "להזמין בלונים");
                assert_eq!(payload["priority"], "high");
                assert!(requires_confirmation);
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn invalid_tool_arguments_are_rejected() {
        let err = tool_reply("create_vendor", r#"{"name":"   "}"#).unwrap_err();
        match err {
            AssistantError::InvalidArguments(errors) => {
                assert_eq!(errors.errors()[0].field, "name")
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = tool_reply(
            "create_event",
            r#"{"title":"ערב","start_datetime":"2026-05-02T18:00:00Z","end_datetime":"2026-05-02T17:00:00Z"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AssistantError::InvalidArguments(_)));
    }

    #[test]
    fn event_time_without_offset_is_israel_local() {
        let reply = tool_reply(
            "create_event",
            r#"{"title":"מסיבת סיום","start_datetime":"2026-06-20T18:00:00","end_datetime":"2026-06-20T21:30"}"#,
        )
        .unwrap();
        let AssistantReply::Action { payload, .. } = reply else {
            panic!("expected action");
        };
        let start: DateTime<chrono::Utc> =
            serde_json::from_value(payload["start_datetime"].clone()).unwrap();
        let end: DateTime<chrono::Utc> =
            serde_json::from_value(payload["end_datetime"].clone()).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-06-20T15:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-06-20T18:30:00+00:00");
    }

    #[test]
    fn event_time_with_offset_is_kept() {
        let reply = tool_reply(
            "create_event",
            r#"{"title":"אסיפה","start_datetime":"2026-01-15T19:00:00+02:00"}"#,
        )
        .unwrap();
        let AssistantReply::Action { payload, .. } = reply else {
            panic!("expected action");
        };
        let start: DateTime<chrono::Utc> =
            serde_json::from_value(payload["start_datetime"].clone()).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-15T17:00:00+00:00");
    }

    #[test]
    fn unknown_tool_and_garbage_arguments() {
        assert!(matches!(
            tool_reply("drop_tables", "{}"),
            Err(AssistantError::UnknownTool(_))
        ));
        assert!(matches!(
            tool_reply("create_task", "not json"),
            Err(AssistantError::Response(_))
        ));
    }

    #[test]
    fn empty_key_is_missing() {
        assert!(matches!(
            AssistantClient::new("  ", "gpt-4o-mini", "https://api.openai.com/v1"),
            Err(AssistantError::MissingApiKey)
        ));
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = AssistantClient::new("sk-test", "gpt-4o-mini", "https://api.openai.com/v1/").unwrap();
        assert_eq!(client.endpoint, "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn tools_are_declared() {
        let tools = tool_definitions();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["function"]["name"].as_str())
            .collect();
        assert_eq!(names, ["create_event", "create_task", "create_vendor"]);
    }
}
