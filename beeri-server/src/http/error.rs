//! API error type and the error envelope
//!
//! Every failure leaves the server as
//! `{"success": false, "error": "...", "details": [...], "code": "..."}`.
//! The body is rendered in Hebrew here; [`ErrorReport`] rides along in the
//! response extensions so the locale middleware can re-render it.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use beeri_core::{Locale, Message, Resource};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::{ValidationError, ValidationErrors};
use crate::services::{AssistantError, PushError, UploadError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Field validation failed (400 with details)
    Validation(ValidationErrors),

    /// Malformed or rejected input (400)
    BadRequest(Message),

    /// Missing or invalid admin session, wrong password (401)
    Unauthorized(Message),

    /// Resource not found (404)
    NotFound(Resource),

    /// State conflict such as an item that is already claimed (409)
    Conflict(Message),

    /// Body or upload over the configured limit (413)
    PayloadTooLarge,

    /// LLM or push provider failed (502, logged)
    Upstream { message: Message, reason: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal(String),
}

/// Everything needed to render an error body in any locale
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: Message,
    pub details: Vec<ValidationError>,
}

impl ErrorReport {
    fn new(status: StatusCode, code: &'static str, message: Message) -> Self {
        Self {
            status,
            code,
            message,
            details: Vec::new(),
        }
    }

    pub fn body(&self, locale: Locale) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message.text(locale),
            "code": self.code,
        });
        if !self.details.is_empty() {
            body["details"] = self
                .details
                .iter()
                .map(|d| d.localized(locale))
                .collect::<Vec<_>>()
                .into();
        }
        body
    }
}

impl ApiError {
    pub fn report(&self) -> ErrorReport {
        match self {
            Self::Validation(errors) => ErrorReport {
                details: errors.errors().to_vec(),
                ..ErrorReport::new(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    Message::ValidationFailed,
                )
            },
            Self::BadRequest(message @ Message::DuplicateName(_)) => {
                ErrorReport::new(StatusCode::BAD_REQUEST, "duplicate", *message)
            }
            Self::BadRequest(message) => {
                ErrorReport::new(StatusCode::BAD_REQUEST, "bad_request", *message)
            }
            Self::Unauthorized(message) => {
                ErrorReport::new(StatusCode::UNAUTHORIZED, "unauthorized", *message)
            }
            Self::NotFound(resource) => ErrorReport::new(
                StatusCode::NOT_FOUND,
                "not_found",
                Message::NotFound(*resource),
            ),
            Self::Conflict(message) => ErrorReport::new(StatusCode::CONFLICT, "conflict", *message),
            Self::PayloadTooLarge => ErrorReport::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                Message::FileTooLarge,
            ),
            Self::Upstream { message, .. } => {
                ErrorReport::new(StatusCode::BAD_GATEWAY, "upstream_error", *message)
            }
            Self::Database(_) | Self::Internal(_) => ErrorReport::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                Message::InternalError,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Database(e) => tracing::error!(error = %e, "database error"),
            Self::Internal(reason) => tracing::error!(%reason, "internal error"),
            Self::Upstream { reason, .. } => tracing::error!(%reason, "upstream error"),
            _ => {}
        }

        let report = self.report();
        let mut response = (report.status, Json(report.body(Locale::He))).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, .. } => Self::NotFound(resource),
            DbError::Duplicate { resource } => Self::BadRequest(Message::DuplicateName(resource)),
            DbError::Unique { .. } | DbError::InvalidReference { .. } | DbError::Constraint { .. } => {
                tracing::debug!(error = %e, "constraint rejected request");
                Self::BadRequest(Message::ValidationFailed)
            }
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Sign(e) => Self::Internal(format!("signing session token: {e}")),
            _ => Self::Unauthorized(Message::Unauthorized),
        }
    }
}

impl From<PushError> for ApiError {
    fn from(e: PushError) -> Self {
        let message = match e {
            PushError::NotConfigured => Message::PushNotConfigured,
            _ => Message::UpstreamFailed,
        };
        Self::Upstream {
            message,
            reason: e.to_string(),
        }
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::InvalidArguments(errors) => Self::Validation(errors),
            AssistantError::MissingApiKey => Self::Upstream {
                message: Message::AssistantUnavailable,
                reason: e.to_string(),
            },
            other => Self::Upstream {
                message: Message::UpstreamFailed,
                reason: other.to_string(),
            },
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::TooLarge { .. } => Self::PayloadTooLarge,
            UploadError::UnsupportedType(_) => Self::BadRequest(Message::UnsupportedFileType),
            UploadError::Empty => Self::BadRequest(Message::MissingFile),
            UploadError::Io(e) => Self::Internal(format!("writing upload: {e}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        tracing::debug!(reason = %rejection.body_text(), "rejected JSON body");
        Self::BadRequest(Message::InvalidJson)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "rejected path parameter");
        Self::BadRequest(Message::InvalidPathParameter)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "rejected query string");
        Self::BadRequest(Message::InvalidPathParameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beeri_core::FieldRule;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400_with_details() {
        let mut errors = ValidationErrors::new();
        errors.push("title", FieldRule::Required);
        errors.push("rating", FieldRule::OutOfRange { min: 1, max: 5 });

        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "validation_error");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
        assert_eq!(body["details"][0], "title: שדה חובה");
    }

    #[tokio::test]
    async fn duplicate_tag_is_400_in_hebrew() {
        let err = ApiError::from(DbError::Duplicate {
            resource: Resource::Tag,
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body["error"], "תגית עם שם זה כבר קיימת");
        assert_eq!(body["code"], "duplicate");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["error"], Message::InternalError.text(Locale::He));
        assert!(!body.to_string().contains("PoolTimedOut"));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (ApiError::NotFound(Resource::Event), StatusCode::NOT_FOUND),
            (ApiError::Unauthorized(Message::Unauthorized), StatusCode::UNAUTHORIZED),
            (ApiError::Conflict(Message::ItemAlreadyClaimed), StatusCode::CONFLICT),
            (ApiError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (ApiError::from(PushError::NotConfigured), StatusCode::BAD_GATEWAY),
            (ApiError::from(AssistantError::MissingApiKey), StatusCode::BAD_GATEWAY),
            (
                ApiError::from(DbError::InvalidReference { constraint: None }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(UploadError::TooLarge { size: 2, limit: 1 }),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ApiError::from(AuthError::Missing), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.report().status, status, "{err:?}");
        }
    }

    #[test]
    fn report_renders_russian() {
        let report = ApiError::Conflict(Message::ItemAlreadyClaimed).report();
        assert_eq!(report.body(Locale::Ru)["error"], "Этот товар уже кто-то взял");
    }

    #[test]
    fn response_carries_report() {
        let response = ApiError::NotFound(Resource::Task).into_response();
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.code, "not_found");
    }
}
