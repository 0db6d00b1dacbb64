//! Event repository
//!
//! Events are never deleted, only archived. Every read filters on
//! `archived_at IS NULL`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use crate::db::DbError;
use crate::models::event::{CreateEvent, EventFilter, UpdateEvent};

/// Event record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: String,
    pub status: String,
    pub visibility: String,
    pub committee_id: Option<Uuid>,
    pub budget_allocated: Option<f64>,
    pub budget_spent: f64,
    pub max_attendees: Option<i32>,
    pub registration_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_token: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    /// Drop the share token before handing the row to a non-admin.
    pub fn without_edit_token(mut self) -> Self {
        self.edit_token = None;
        self
    }

    /// Whether an anonymous caller may see this event.
    pub fn is_publicly_visible(&self) -> bool {
        self.visibility == "public" && self.status != "draft"
    }
}

#[derive(Clone, Copy)]
enum EventKey<'k> {
    Id(Uuid),
    EditToken(&'k str),
}

/// Event repository
pub struct EventRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List non-archived events by start time.
    ///
    /// `include_hidden` adds private and draft events (admin view).
    pub async fn list(
        &self,
        filter: &EventFilter,
        include_hidden: bool,
    ) -> Result<Vec<EventRow>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT * FROM events
            WHERE archived_at IS NULL
              AND ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR committee_id = $2)
              AND (NOT $3 OR COALESCE(end_datetime, start_datetime) >= NOW())
              AND ($4 OR (visibility = 'public' AND status <> 'draft'))
            ORDER BY start_datetime ASC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.committee_id)
        .bind(filter.upcoming)
        .bind(include_hidden)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<EventRow, DbError> {
        sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Event, id))
    }

    pub async fn get_by_edit_token(&self, token: &str) -> Result<EventRow, DbError> {
        sqlx::query_as::<_, EventRow>(
            "SELECT * FROM events WHERE edit_token = $1 AND archived_at IS NULL",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Event, token))
    }

    pub async fn create(&self, input: &CreateEvent, edit_token: &str) -> Result<EventRow, DbError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (
                title, description, start_datetime, end_datetime, location,
                event_type, status, visibility, committee_id, budget_allocated,
                max_attendees, registration_enabled, edit_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, FALSE), $13)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.start_datetime)
        .bind(input.end_datetime)
        .bind(input.location.as_deref())
        .bind(input.event_type.trim())
        .bind(input.status.as_str())
        .bind(input.visibility.as_str())
        .bind(input.committee_id)
        .bind(input.budget_allocated)
        .bind(input.max_attendees)
        .bind(input.registration_enabled)
        .bind(edit_token)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(event_id = %row.id, status = %row.status, "event created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateEvent) -> Result<EventRow, DbError> {
        self.update_where(EventKey::Id(id), input)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Event, id))
    }

    /// Update through the share link. Same partial-update rules as [`update`](Self::update).
    pub async fn update_by_edit_token(
        &self,
        token: &str,
        input: &UpdateEvent,
    ) -> Result<EventRow, DbError> {
        self.update_where(EventKey::EditToken(token), input)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Event, token))
    }

    async fn update_where(
        &self,
        key: EventKey<'_>,
        input: &UpdateEvent,
    ) -> Result<Option<EventRow>, DbError> {
        let predicate = match key {
            EventKey::Id(_) => "id = $1",
            EventKey::EditToken(_) => "edit_token = $1",
        };
        let sql = format!(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_datetime = COALESCE($4, start_datetime),
                end_datetime = COALESCE($5, end_datetime),
                location = COALESCE($6, location),
                event_type = COALESCE($7, event_type),
                status = COALESCE($8, status),
                visibility = COALESCE($9, visibility),
                committee_id = COALESCE($10, committee_id),
                budget_allocated = COALESCE($11, budget_allocated),
                budget_spent = COALESCE($12, budget_spent),
                max_attendees = COALESCE($13, max_attendees),
                registration_enabled = COALESCE($14, registration_enabled),
                updated_at = NOW()
            WHERE {predicate} AND archived_at IS NULL
            RETURNING *
            "#
        );

        let query = sqlx::query_as::<_, EventRow>(&sql);
        let query = match key {
            EventKey::Id(id) => query.bind(id),
            EventKey::EditToken(token) => query.bind(token),
        };
        let row = query
            .bind(input.title.as_deref().map(str::trim))
            .bind(input.description.as_deref())
            .bind(input.start_datetime)
            .bind(input.end_datetime)
            .bind(input.location.as_deref())
            .bind(input.event_type.as_deref().map(str::trim))
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.visibility.map(|v| v.as_str()))
            .bind(input.committee_id)
            .bind(input.budget_allocated)
            .bind(input.budget_spent)
            .bind(input.max_attendees)
            .bind(input.registration_enabled)
            .fetch_optional(self.pool)
            .await?;

        Ok(row)
    }

    /// Soft delete. Archiving twice reports not found.
    pub async fn archive(&self, id: Uuid) -> Result<(), DbError> {
        let done = sqlx::query(
            "UPDATE events SET archived_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::Event, id));
        }
        tracing::info!(event_id = %id, "event archived");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::event::{EventStatus, Visibility};

    fn draft(title: &str) -> CreateEvent {
        CreateEvent {
            title: title.to_string(),
            description: None,
            start_datetime: Utc::now() + chrono::Duration::days(3),
            end_datetime: None,
            location: Some("אולם הספורט".into()),
            event_type: "general".into(),
            status: EventStatus::Draft,
            visibility: Visibility::Public,
            committee_id: None,
            budget_allocated: None,
            max_attendees: None,
            registration_enabled: None,
        }
    }

    #[test]
    fn public_visibility_rule() {
        let now = Utc::now();
        let mut row = EventRow {
            id: Uuid::nil(),
            title: "x".into(),
            description: None,
            start_datetime: now,
            end_datetime: None,
            location: None,
            event_type: "general".into(),
            status: "published".into(),
            visibility: "public".into(),
            committee_id: None,
            budget_allocated: None,
            budget_spent: 0.0,
            max_attendees: None,
            registration_enabled: false,
            edit_token: Some("secret".into()),
            archived_at: None,
            created_at: now,
            updated_at: now,
        };
        assert!(row.is_publicly_visible());
        row.status = "draft".into();
        assert!(!row.is_publicly_visible());

        let json = serde_json::to_value(row.without_edit_token()).unwrap();
        assert!(json.get("edit_token").is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn archived_event_disappears() {
        let pool = test_pool().await;
        let repo = EventRepo::new(&pool);
        let token = beeri_core::token::generate_share_token();
        let event = repo.create(&draft("ערב הורים"), &token).await.unwrap();

        repo.archive(event.id).await.unwrap();

        assert!(matches!(repo.get(event.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.archive(event.id).await, Err(DbError::NotFound { .. })));
        let listed = repo.list(&EventFilter::default(), true).await.unwrap();
        assert!(listed.iter().all(|e| e.id != event.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn drafts_hidden_from_public_list() {
        let pool = test_pool().await;
        let repo = EventRepo::new(&pool);
        let token = beeri_core::token::generate_share_token();
        let event = repo.create(&draft("טיול שנתי"), &token).await.unwrap();

        let public = repo.list(&EventFilter::default(), false).await.unwrap();
        assert!(public.iter().all(|e| e.id != event.id));
        let admin = repo.list(&EventFilter::default(), true).await.unwrap();
        assert!(admin.iter().any(|e| e.id == event.id));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn partial_update_keeps_other_fields() {
        let pool = test_pool().await;
        let repo = EventRepo::new(&pool);
        let token = beeri_core::token::generate_share_token();
        let event = repo.create(&draft("מסיבת סוף שנה"), &token).await.unwrap();

        let updated = repo
            .update_by_edit_token(
                &token,
                &UpdateEvent {
                    status: Some(EventStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "published");
        assert_eq!(updated.title, event.title);
        assert_eq!(updated.location, event.location);
    }
}
