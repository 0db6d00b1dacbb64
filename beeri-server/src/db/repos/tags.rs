//! Tag repository
//!
//! Tag names are unique. A duplicate insert or rename is rejected by the
//! database and surfaces as `DbError::Duplicate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::delete_by_id;
use crate::db::DbError;
use crate::models::tag::{CreateTag, UpdateTag};

/// Tag record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagRow {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub emoji: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tag with the number of tasks carrying it
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tag: TagRow,
    pub usage_count: i64,
}

/// Compact tag embedded in task rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub emoji: Option<String>,
}

/// Tag repository
pub struct TagRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List tags with usage counts in one query.
    pub async fn list(&self) -> Result<Vec<TagWithUsage>, DbError> {
        let rows = sqlx::query_as::<_, TagWithUsage>(
            r#"
            SELECT t.*, COUNT(tt.task_id) AS usage_count
            FROM tags t
            LEFT JOIN task_tags tt ON tt.tag_id = t.id
            GROUP BY t.id
            ORDER BY t.name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<TagRow, DbError> {
        sqlx::query_as::<_, TagRow>("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Tag, id))
    }

    pub async fn create(&self, input: &CreateTag) -> Result<TagRow, DbError> {
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO tags (name, color, emoji) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(input.normalized_name())
        .bind(&input.color)
        .bind(input.emoji.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).duplicate_of(Resource::Tag))?;

        tracing::info!(tag_id = %row.id, name = %row.name, "tag created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateTag) -> Result<TagRow, DbError> {
        sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE tags SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                emoji = COALESCE($4, emoji),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.color.as_deref())
        .bind(input.emoji.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::from(e).duplicate_of(Resource::Tag))?
        .ok_or_else(|| DbError::not_found(Resource::Tag, id))
    }

    /// Delete a tag; its task links go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "tags", Resource::Tag, id).await
    }
}
