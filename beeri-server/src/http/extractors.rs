//! Custom Axum extractors
//!
//! [`AdminSession`] only looks at headers, so placed before a body
//! extractor it answers 401 without ever parsing the payload.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use axum_extra::extract::CookieJar;
use beeri_core::{Locale, Message};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::server::AppState;
use crate::auth::{AuthError, Claims, SESSION_COOKIE};
use crate::models::Validate;

/// Session token from the `auth-token` cookie, else `Authorization: Bearer`.
fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn verify(parts: &Parts, state: &AppState) -> Result<Claims, AuthError> {
    let token = session_token(parts).ok_or(AuthError::Missing)?;
    state.auth.verify(&token)
}

/// A verified admin session; rejects with 401.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match verify(parts, state) {
            Ok(claims) => Ok(Self(claims)),
            Err(e) => {
                tracing::debug!(error = %e, path = %parts.uri.path(), "admin session rejected");
                Err(ApiError::Unauthorized(Message::Unauthorized))
            }
        }
    }
}

/// Whether the caller is an admin. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAdmin(pub bool);

impl FromRequestParts<Arc<AppState>> for MaybeAdmin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(verify(parts, state).is_ok()))
    }
}

/// JSON body that parsed and passed [`Validate`].
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters; a malformed id is a 400 in the envelope.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Query string with rejections in the envelope.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Locale chosen by the locale middleware; Hebrew if it did not run.
#[derive(Debug, Clone, Copy)]
pub struct RequestLocale(pub Locale);

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Locale>().copied().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts(header: (&str, &str)) -> Parts {
        let (parts, _) = HttpRequest::builder()
            .uri("/api/x")
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn token_from_cookie() {
        let p = parts(("cookie", "locale=he; auth-token=abc.def.ghi"));
        assert_eq!(session_token(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn token_from_bearer() {
        let p = parts(("authorization", "Bearer abc.def.ghi"));
        assert_eq!(session_token(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn no_token() {
        assert!(session_token(&parts(("authorization", "Basic Zm9vOmJhcg=="))).is_none());
        assert!(session_token(&parts(("cookie", "auth-token="))).is_none());
    }
}
