//! Meeting protocol repository

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::{delete_by_id, delete_each, paginate, AuditedTable, BulkDeleteReport, Counted};
use crate::db::DbError;
use crate::models::protocol::{CreateProtocol, UpdateProtocol};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProtocolRow {
    pub id: Uuid,
    pub title: String,
    pub protocol_date: NaiveDate,
    pub content: Option<String>,
    pub attendees: Vec<String>,
    pub decisions: Vec<String>,
    pub document_url: Option<String>,
    pub committee_id: Option<Uuid>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Protocol repository
pub struct ProtocolRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ProtocolRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first. Without `include_private` only public protocols are returned.
    pub async fn list(
        &self,
        page: Pagination,
        include_private: bool,
    ) -> Result<Paginated<ProtocolRow>, DbError> {
        let rows = sqlx::query_as::<_, Counted<ProtocolRow>>(
            r#"
            SELECT p.*, COUNT(*) OVER() AS total
            FROM protocols p
            WHERE $1 OR p.is_public
            ORDER BY p.protocol_date DESC, p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(include_private)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProtocolRow, DbError> {
        sqlx::query_as::<_, ProtocolRow>("SELECT * FROM protocols WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Protocol, id))
    }

    pub async fn create(&self, input: &CreateProtocol) -> Result<ProtocolRow, DbError> {
        let row = sqlx::query_as::<_, ProtocolRow>(
            r#"
            INSERT INTO protocols (
                title, protocol_date, content, attendees, decisions,
                document_url, committee_id, is_public
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.protocol_date)
        .bind(input.content.as_deref())
        .bind(&input.attendees)
        .bind(&input.decisions)
        .bind(input.document_url.as_deref())
        .bind(input.committee_id)
        .bind(input.is_public)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(protocol_id = %row.id, date = %row.protocol_date, "protocol created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateProtocol) -> Result<ProtocolRow, DbError> {
        sqlx::query_as::<_, ProtocolRow>(
            r#"
            UPDATE protocols SET
                title = COALESCE($2, title),
                protocol_date = COALESCE($3, protocol_date),
                content = COALESCE($4, content),
                attendees = COALESCE($5, attendees),
                decisions = COALESCE($6, decisions),
                document_url = COALESCE($7, document_url),
                committee_id = COALESCE($8, committee_id),
                is_public = COALESCE($9, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.protocol_date)
        .bind(input.content.as_deref())
        .bind(input.attendees.as_ref())
        .bind(input.decisions.as_ref())
        .bind(input.document_url.as_deref())
        .bind(input.committee_id)
        .bind(input.is_public)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Protocol, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "protocols", Resource::Protocol, id).await
    }

    pub async fn bulk_delete(&self, ids: &[Uuid]) -> BulkDeleteReport {
        delete_each(self.pool, AuditedTable::Protocols, ids).await
    }
}
