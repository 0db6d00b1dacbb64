//! Web push subscriptions and broadcast
//!
//! Pushes carry no payload; the service worker fetches
//! `/api/notifications/latest` when woken.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{NotificationRow, PushRepo, SubscriptionRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::extractors::{AdminSession, ValidJson};
use crate::http::server::AppState;
use crate::models::notification::{SendNotification, Subscribe, Unsubscribe};
use crate::services::{fan_out, PushError, PushTarget};

#[derive(Debug, Serialize)]
struct PublicKey {
    public_key: String,
}

/// GET /api/notifications/vapid-public-key
async fn vapid_public_key(State(state): State<Arc<AppState>>) -> ApiResult<PublicKey> {
    let public_key = state.push.public_key().ok_or(PushError::NotConfigured)?;
    Ok(ok(PublicKey {
        public_key: public_key.to_string(),
    }))
}

/// POST /api/notifications/subscribe
async fn subscribe(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<Subscribe>,
) -> Created<SubscriptionRow> {
    let row = PushRepo::new(&state.pool).upsert_subscription(&input).await?;
    Ok(created(row))
}

#[derive(Debug, Serialize)]
struct Removed {
    removed: bool,
}

/// POST /api/notifications/unsubscribe
async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<Unsubscribe>,
) -> ApiResult<Removed> {
    let removed = PushRepo::new(&state.pool)
        .delete_by_endpoint(input.endpoint.trim())
        .await?;
    Ok(ok(Removed { removed }))
}

#[derive(Debug, Serialize)]
pub struct BroadcastReport {
    pub notification_id: Uuid,
    pub sent: usize,
    pub failed: usize,
    /// Subscriptions deleted because the push service reported them gone
    pub removed: u64,
}

/// POST /api/notifications/send
#[instrument(skip_all)]
async fn send(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<SendNotification>,
) -> ApiResult<BroadcastReport> {
    if state.push.public_key().is_none() {
        return Err(PushError::NotConfigured.into());
    }

    let repo = PushRepo::new(&state.pool);
    let notification = repo
        .record_notification(&input.title, &input.body, input.url.as_deref())
        .await?;

    let targets: Vec<PushTarget> = repo
        .list_subscriptions()
        .await?
        .into_iter()
        .map(|s| PushTarget {
            id: s.id,
            endpoint: s.endpoint,
        })
        .collect();

    let report = fan_out(state.push.as_ref(), &targets).await;

    let removed = if report.expired.is_empty() {
        0
    } else {
        repo.delete_subscriptions(&report.expired).await?
    };
    repo.mark_used(&report.delivered).await?;
    repo.record_delivery(notification.id, report.sent as i32, report.failed as i32)
        .await?;

    tracing::info!(
        notification_id = %notification.id,
        targets = targets.len(),
        sent = report.sent,
        failed = report.failed,
        removed,
        "notification broadcast"
    );

    Ok(ok(BroadcastReport {
        notification_id: notification.id,
        sent: report.sent,
        failed: report.failed,
        removed,
    }))
}

/// GET /api/notifications/latest - `null` before the first broadcast
async fn latest(State(state): State<Arc<AppState>>) -> ApiResult<Option<NotificationRow>> {
    Ok(ok(PushRepo::new(&state.pool).latest().await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications/vapid-public-key", get(vapid_public_key))
        .route("/notifications/subscribe", post(subscribe))
        .route("/notifications/unsubscribe", post(unsubscribe))
        .route("/notifications/send", post(send))
        .route("/notifications/latest", get(latest))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{get, post_json};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn public_key_without_vapid_is_502() {
        let (status, body) = get("/api/notifications/vapid-public-key").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "שליחת התראות אינה מוגדרת בשרת");
    }

    #[tokio::test]
    async fn send_requires_admin() {
        let (status, _) = post_json(
            "/api/notifications/send",
            r#"{"title":"תזכורת","body":"מחר טיול"}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn send_without_vapid_fails_before_storing() {
        let (status, body) = post_json(
            "/api/notifications/send",
            r#"{"title":"תזכורת","body":"מחר טיול"}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "upstream_error");
    }

    #[tokio::test]
    async fn insecure_endpoint_is_rejected() {
        let (status, body) = post_json(
            "/api/notifications/subscribe",
            r#"{"endpoint":"http://push.example.org/x","keys":{"p256dh":"k","auth":"a"}}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("endpoint:"));
    }
}
