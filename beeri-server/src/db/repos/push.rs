//! Push subscriptions and the stored notifications they are woken for

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::DbError;
use crate::models::notification::Subscribe;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
}

pub struct PushRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PushRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh keys for an endpoint. Browsers rotate keys without
    /// changing the endpoint.
    pub async fn upsert_subscription(&self, input: &Subscribe) -> Result<SubscriptionRow, DbError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO push_subscriptions (endpoint, p256dh, auth, user_agent)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth,
                user_agent = COALESCE(EXCLUDED.user_agent, push_subscriptions.user_agent)
            RETURNING *
            "#,
        )
        .bind(input.endpoint.trim())
        .bind(&input.keys.p256dh)
        .bind(&input.keys.auth)
        .bind(input.user_agent.as_deref())
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    /// Returns whether a subscription was removed.
    pub async fn delete_by_endpoint(&self, endpoint: &str) -> Result<bool, DbError> {
        let done = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint.trim())
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn list_subscriptions(&self) -> Result<Vec<SubscriptionRow>, DbError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT * FROM push_subscriptions ORDER BY created_at",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete_subscriptions(&self, ids: &[Uuid]) -> Result<u64, DbError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let done = sqlx::query("DELETE FROM push_subscriptions WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn mark_used(&self, ids: &[Uuid]) -> Result<(), DbError> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE push_subscriptions SET last_used_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_notification(
        &self,
        title: &str,
        body: &str,
        url: Option<&str>,
    ) -> Result<NotificationRow, DbError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "INSERT INTO push_notifications (title, body, url) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(title.trim())
        .bind(body.trim())
        .bind(url)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn record_delivery(&self, id: Uuid, sent: i32, failed: i32) -> Result<(), DbError> {
        sqlx::query("UPDATE push_notifications SET sent_count = $2, failed_count = $3 WHERE id = $1")
            .bind(id)
            .bind(sent)
            .bind(failed)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn latest(&self) -> Result<Option<NotificationRow>, DbError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM push_notifications ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}
