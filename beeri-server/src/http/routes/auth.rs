//! Admin login, logout and session check

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use beeri_core::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{clear_session_cookie, session_cookie};
use crate::http::envelope::ok;
use crate::http::error::ApiError;
use crate::http::extractors::{MaybeAdmin, RequestLocale, ValidJson};
use crate::http::server::AppState;
use crate::models::{Validate, ValidationErrors};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("password", &self.password, 200);
        errors.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.auth.check_password(&req.password) {
        tracing::warn!("admin login with wrong password");
        return Err(ApiError::Unauthorized(Message::InvalidCredentials));
    }

    let now = Utc::now();
    let token = state.auth.issue(now)?;
    let cookie = session_cookie(&token, state.auth.ttl(), state.secure_cookies);
    tracing::info!("admin logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ok(SessionStatus {
            authenticated: true,
            expires_at: Some(now + state.auth.ttl()),
        }),
    ))
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    message: String,
}

/// POST /api/auth/logout
async fn logout(
    State(state): State<Arc<AppState>>,
    RequestLocale(locale): RequestLocale,
) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie(state.secure_cookies))]),
        ok(LogoutResponse {
            message: Message::LoggedOut.text(locale),
        }),
    )
}

/// GET /api/auth/verify
async fn verify(MaybeAdmin(is_admin): MaybeAdmin) -> impl IntoResponse {
    ok(SessionStatus {
        authenticated: is_admin,
        expires_at: None,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/verify", get(verify))
}
