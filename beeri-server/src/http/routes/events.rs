//! Event endpoints
//!
//! Anonymous callers see published public events only, and never the
//! edit token. The token link gives edit access to one event without a
//! session.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use beeri_core::token::{generate_share_token, looks_like_share_token};
use beeri_core::Resource;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{EventRepo, EventRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminSession, MaybeAdmin, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::event::{CreateEvent, EventFilter, UpdateEvent};

/// GET /api/events
async fn list_events(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidQuery(filter): ValidQuery<EventFilter>,
) -> ApiResult<Vec<EventRow>> {
    let events = EventRepo::new(&state.pool).list(&filter, is_admin).await?;
    let events = if is_admin {
        events
    } else {
        events.into_iter().map(EventRow::without_edit_token).collect()
    };
    Ok(ok(events))
}

/// POST /api/events
#[instrument(skip_all)]
async fn create_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateEvent>,
) -> Created<EventRow> {
    let event = EventRepo::new(&state.pool)
        .create(&input, &generate_share_token())
        .await?;
    tracing::info!(event_id = %event.id, "event created");
    Ok(created(event))
}

/// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<EventRow> {
    let event = EventRepo::new(&state.pool).get(id).await?;
    if is_admin {
        return Ok(ok(event));
    }
    if !event.is_publicly_visible() {
        return Err(ApiError::NotFound(Resource::Event));
    }
    Ok(ok(event.without_edit_token()))
}

/// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateEvent>,
) -> ApiResult<EventRow> {
    let event = EventRepo::new(&state.pool).update(id, &input).await?;
    Ok(ok(event))
}

/// DELETE /api/events/{id} - soft delete
async fn archive_event(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    EventRepo::new(&state.pool).archive(id).await?;
    tracing::info!(event_id = %id, "event archived");
    Ok(ok(()))
}

fn checked_token(token: &str) -> Result<&str, ApiError> {
    if looks_like_share_token(token) {
        Ok(token)
    } else {
        Err(ApiError::NotFound(Resource::Event))
    }
}

/// GET /api/events/edit/{token}
async fn get_by_token(
    State(state): State<Arc<AppState>>,
    ValidPath(token): ValidPath<String>,
) -> ApiResult<EventRow> {
    let token = checked_token(&token)?;
    let event = EventRepo::new(&state.pool).get_by_edit_token(token).await?;
    Ok(ok(event))
}

/// PUT /api/events/edit/{token}
async fn update_by_token(
    State(state): State<Arc<AppState>>,
    ValidPath(token): ValidPath<String>,
    ValidJson(input): ValidJson<UpdateEvent>,
) -> ApiResult<EventRow> {
    let token = checked_token(&token)?;
    let event = EventRepo::new(&state.pool)
        .update_by_edit_token(token, &input)
        .await?;
    tracing::info!(event_id = %event.id, "event updated through edit link");
    Ok(ok(event))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(archive_event),
        )
        .route("/events/edit/{token}", get(get_by_token).put(update_by_token))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{get, post_json, request_json};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn create_requires_admin_even_with_bad_body() {
        let (status, body) = post_json("/api/events", "{not json", false).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "נדרשת התחברות כמנהל");
    }

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let (status, body) = post_json(
            "/api/events",
            r#"{"title":"מסיבת סיום","start_datetime":"2026-06-20T18:00:00Z","end_datetime":"2026-06-20T16:00:00Z"}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("end_datetime:"));
    }

    #[tokio::test]
    async fn unknown_status_is_bad_json() {
        let (status, body) = post_json(
            "/api/events",
            r#"{"title":"x","start_datetime":"2026-06-20T18:00:00Z","status":"maybe"}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let (status, body) = get("/api/events/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let (status, _) = request_json(
            "DELETE",
            "/api/events/7f0c1f3e-8a51-4a38-9a50-0d5f3c1d9b11",
            "",
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bogus_edit_token_is_404_without_lookup() {
        let (status, _) = get("/api/events/edit/..%2F..%2Fetc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
