//! Committees, vendors, tickets and highlights
//!
//! Plain CRUD tables. Vendor deletes are audited.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::{delete_by_id, delete_each, AuditedTable, BulkDeleteReport};
use crate::db::DbError;
use crate::models::directory::{
    CreateCommittee, CreateHighlight, CreateTicket, CreateVendor, UpdateCommittee,
    UpdateHighlight, UpdateTicket, UpdateVendor,
};

// ---------------------------------------------------------------------------
// Committees

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommitteeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub chair_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct CommitteeRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommitteeRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CommitteeRow>, DbError> {
        let rows = sqlx::query_as::<_, CommitteeRow>("SELECT * FROM committees ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<CommitteeRow, DbError> {
        sqlx::query_as::<_, CommitteeRow>("SELECT * FROM committees WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Committee, id))
    }

    pub async fn create(&self, input: &CreateCommittee) -> Result<CommitteeRow, DbError> {
        let row = sqlx::query_as::<_, CommitteeRow>(
            r#"
            INSERT INTO committees (name, description, color, chair_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.color.as_deref())
        .bind(input.chair_name.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).duplicate_of(Resource::Committee))?;

        tracing::info!(committee_id = %row.id, "committee created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateCommittee) -> Result<CommitteeRow, DbError> {
        sqlx::query_as::<_, CommitteeRow>(
            r#"
            UPDATE committees SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                chair_name = COALESCE($5, chair_name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.color.as_deref())
        .bind(input.chair_name.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::from(e).duplicate_of(Resource::Committee))?
        .ok_or_else(|| DbError::not_found(Resource::Committee, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "committees", Resource::Committee, id).await
    }
}

// ---------------------------------------------------------------------------
// Vendors

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorRow {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct VendorRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> VendorRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<VendorRow>, DbError> {
        let rows = sqlx::query_as::<_, VendorRow>(
            r#"
            SELECT * FROM vendors
            WHERE $1::text IS NULL OR category = $1
            ORDER BY rating DESC NULLS LAST, name
            "#,
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<VendorRow, DbError> {
        sqlx::query_as::<_, VendorRow>("SELECT * FROM vendors WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Vendor, id))
    }

    pub async fn create(&self, input: &CreateVendor) -> Result<VendorRow, DbError> {
        let row = sqlx::query_as::<_, VendorRow>(
            r#"
            INSERT INTO vendors (name, category, contact_name, phone, email, website, notes, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.name.trim())
        .bind(input.category.as_deref())
        .bind(input.contact_name.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(input.website.as_deref())
        .bind(input.notes.as_deref())
        .bind(input.rating)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(vendor_id = %row.id, "vendor created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateVendor) -> Result<VendorRow, DbError> {
        sqlx::query_as::<_, VendorRow>(
            r#"
            UPDATE vendors SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                contact_name = COALESCE($4, contact_name),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                website = COALESCE($7, website),
                notes = COALESCE($8, notes),
                rating = COALESCE($9, rating),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.category.as_deref())
        .bind(input.contact_name.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(input.website.as_deref())
        .bind(input.notes.as_deref())
        .bind(input.rating)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Vendor, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "vendors", Resource::Vendor, id).await
    }

    pub async fn bulk_delete(&self, ids: &[Uuid]) -> BulkDeleteReport {
        delete_each(self.pool, AuditedTable::Vendors, ids).await
    }
}

// ---------------------------------------------------------------------------
// Tickets

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TicketRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub price: Option<f64>,
    pub quantity_available: Option<i32>,
    pub purchase_url: Option<String>,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct TicketRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upcoming first. Archived tickets only with `include_archived`.
    pub async fn list(&self, include_archived: bool) -> Result<Vec<TicketRow>, DbError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT * FROM tickets
            WHERE $1 OR status <> 'archived'
            ORDER BY event_date ASC NULLS LAST, created_at DESC
            "#,
        )
        .bind(include_archived)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<TicketRow, DbError> {
        sqlx::query_as::<_, TicketRow>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Ticket, id))
    }

    pub async fn create(&self, input: &CreateTicket) -> Result<TicketRow, DbError> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            INSERT INTO tickets (
                title, description, event_date, venue, price,
                quantity_available, purchase_url, image_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.event_date)
        .bind(input.venue.as_deref())
        .bind(input.price)
        .bind(input.quantity_available)
        .bind(input.purchase_url.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.status.as_str())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(ticket_id = %row.id, "ticket created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateTicket) -> Result<TicketRow, DbError> {
        sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                event_date = COALESCE($4, event_date),
                venue = COALESCE($5, venue),
                price = COALESCE($6, price),
                quantity_available = COALESCE($7, quantity_available),
                purchase_url = COALESCE($8, purchase_url),
                image_url = COALESCE($9, image_url),
                status = COALESCE($10, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.event_date)
        .bind(input.venue.as_deref())
        .bind(input.price)
        .bind(input.quantity_available)
        .bind(input.purchase_url.as_deref())
        .bind(input.image_url.as_deref())
        .bind(input.status.map(|s| s.as_str()))
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Ticket, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "tickets", Resource::Ticket, id).await
    }
}

// ---------------------------------------------------------------------------
// Highlights

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HighlightRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct HighlightRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> HighlightRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<HighlightRow>, DbError> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            r#"
            SELECT * FROM highlights
            WHERE $1 OR is_active
            ORDER BY display_order, created_at DESC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, input: &CreateHighlight) -> Result<HighlightRow, DbError> {
        let row = sqlx::query_as::<_, HighlightRow>(
            r#"
            INSERT INTO highlights (
                title, description, icon, category, event_date,
                cta_text, cta_link, display_order, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.icon.as_deref())
        .bind(input.category.as_deref())
        .bind(input.event_date)
        .bind(input.cta_text.as_deref())
        .bind(input.cta_link.as_deref())
        .bind(input.display_order)
        .bind(input.is_active)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateHighlight) -> Result<HighlightRow, DbError> {
        sqlx::query_as::<_, HighlightRow>(
            r#"
            UPDATE highlights SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                icon = COALESCE($4, icon),
                category = COALESCE($5, category),
                event_date = COALESCE($6, event_date),
                cta_text = COALESCE($7, cta_text),
                cta_link = COALESCE($8, cta_link),
                display_order = COALESCE($9, display_order),
                is_active = COALESCE($10, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.icon.as_deref())
        .bind(input.category.as_deref())
        .bind(input.event_date)
        .bind(input.cta_text.as_deref())
        .bind(input.cta_link.as_deref())
        .bind(input.display_order)
        .bind(input.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Highlight, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "highlights", Resource::Highlight, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn committee_names_are_unique() {
        let pool = test_pool().await;
        let repo = CommitteeRepo::new(&pool);
        let input = CreateCommittee {
            name: format!("ועדת קישוט {}", Uuid::new_v4().simple()),
            description: None,
            color: None,
            chair_name: None,
        };
        repo.create(&input).await.unwrap();
        let err = repo.create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate { resource: Resource::Committee }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn vendor_delete_is_audited() {
        let pool = test_pool().await;
        let repo = VendorRepo::new(&pool);
        let vendor = repo
            .create(&CreateVendor {
                name: "קייטרינג השכונה".into(),
                category: Some("catering".into()),
                contact_name: None,
                phone: None,
                email: None,
                website: None,
                notes: None,
                rating: Some(4),
            })
            .await
            .unwrap();

        repo.delete(vendor.id).await.unwrap();

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM audit_log WHERE table_name = 'vendors' AND row_id = $1")
                .bind(vendor.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
        assert!(matches!(repo.get(vendor.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn inactive_highlights_hidden_by_default() {
        let pool = test_pool().await;
        let repo = HighlightRepo::new(&pool);
        let hidden = repo
            .create(&CreateHighlight {
                title: "הרשמה לחוגים".into(),
                description: None,
                icon: None,
                category: None,
                event_date: None,
                cta_text: None,
                cta_link: None,
                display_order: 0,
                is_active: false,
            })
            .await
            .unwrap();

        let visible = repo.list(false).await.unwrap();
        assert!(visible.iter().all(|h| h.id != hidden.id));
        let all = repo.list(true).await.unwrap();
        assert!(all.iter().any(|h| h.id == hidden.id));
    }
}
