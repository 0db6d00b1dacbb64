//! Prom repository: the prom event, vendor quotes, votes and budget lines
//!
//! Quotes, votes and budget lines all hang off one prom event and are
//! always addressed together with its id, so a quote of one prom can never
//! be edited through another prom's URL.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::delete_by_id;
use crate::db::DbError;
use crate::models::prom::{
    CreateBudgetItem, CreatePromEvent, CreateQuote, UpdateBudgetItem, UpdatePromEvent, UpdateQuote,
};
use crate::models::prom_stats::{BudgetLine, QuoteInfo, VoteSample};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromEventRow {
    pub id: Uuid,
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub budget_total: Option<f64>,
    pub student_count: Option<i32>,
    pub status: String,
    pub voting_enabled: bool,
    pub voting_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuoteRow {
    pub id: Uuid,
    pub prom_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub category: String,
    pub vendor_name: String,
    pub price_total: Option<f64>,
    pub price_per_student: Option<f64>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub document_url: Option<String>,
    pub is_finalist: bool,
    pub is_selected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VoteRow {
    pub id: Uuid,
    pub prom_id: Uuid,
    pub quote_id: Uuid,
    #[serde(skip_serializing)]
    pub voter_hash: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BudgetItemRow {
    pub id: Uuid,
    pub prom_id: Uuid,
    pub quote_id: Option<Uuid>,
    pub category: String,
    pub description: Option<String>,
    pub estimated_amount: f64,
    pub actual_amount: Option<f64>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Prom repository
pub struct PromRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PromRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -- prom events --------------------------------------------------------

    pub async fn list(&self) -> Result<Vec<PromEventRow>, DbError> {
        let rows = sqlx::query_as::<_, PromEventRow>(
            "SELECT * FROM prom_events ORDER BY event_date DESC NULLS LAST, created_at DESC",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<PromEventRow, DbError> {
        sqlx::query_as::<_, PromEventRow>("SELECT * FROM prom_events WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::PromEvent, id))
    }

    pub async fn create(&self, input: &CreatePromEvent) -> Result<PromEventRow, DbError> {
        let row = sqlx::query_as::<_, PromEventRow>(
            r#"
            INSERT INTO prom_events (
                title, event_date, venue, description, budget_total,
                student_count, status, voting_enabled, voting_ends_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.event_date)
        .bind(input.venue.as_deref())
        .bind(input.description.as_deref())
        .bind(input.budget_total)
        .bind(input.student_count)
        .bind(input.status.as_str())
        .bind(input.voting_enabled)
        .bind(input.voting_ends_at)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(prom_id = %row.id, "prom event created");
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, input: &UpdatePromEvent) -> Result<PromEventRow, DbError> {
        sqlx::query_as::<_, PromEventRow>(
            r#"
            UPDATE prom_events SET
                title = COALESCE($2, title),
                event_date = COALESCE($3, event_date),
                venue = COALESCE($4, venue),
                description = COALESCE($5, description),
                budget_total = COALESCE($6, budget_total),
                student_count = COALESCE($7, student_count),
                status = COALESCE($8, status),
                voting_enabled = COALESCE($9, voting_enabled),
                voting_ends_at = COALESCE($10, voting_ends_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.event_date)
        .bind(input.venue.as_deref())
        .bind(input.description.as_deref())
        .bind(input.budget_total)
        .bind(input.student_count)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.voting_enabled)
        .bind(input.voting_ends_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::PromEvent, id))
    }

    /// Deletes quotes, votes and budget lines with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "prom_events", Resource::PromEvent, id).await
    }

    // -- quotes -------------------------------------------------------------

    pub async fn list_quotes(&self, prom_id: Uuid) -> Result<Vec<QuoteRow>, DbError> {
        let rows = sqlx::query_as::<_, QuoteRow>(
            r#"
            SELECT * FROM prom_vendor_quotes
            WHERE prom_id = $1
            ORDER BY category, is_finalist DESC, price_total ASC NULLS LAST
            "#,
        )
        .bind(prom_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_quote(&self, prom_id: Uuid, quote_id: Uuid) -> Result<QuoteRow, DbError> {
        sqlx::query_as::<_, QuoteRow>(
            "SELECT * FROM prom_vendor_quotes WHERE id = $1 AND prom_id = $2",
        )
        .bind(quote_id)
        .bind(prom_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::PromQuote, quote_id))
    }

    pub async fn create_quote(&self, prom_id: Uuid, input: &CreateQuote) -> Result<QuoteRow, DbError> {
        let row = sqlx::query_as::<_, QuoteRow>(
            r#"
            INSERT INTO prom_vendor_quotes (
                prom_id, vendor_id, category, vendor_name, price_total,
                price_per_student, description, contact_info, document_url, is_finalist
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(prom_id)
        .bind(input.vendor_id)
        .bind(input.category.trim())
        .bind(input.vendor_name.trim())
        .bind(input.price_total)
        .bind(input.price_per_student)
        .bind(input.description.as_deref())
        .bind(input.contact_info.as_deref())
        .bind(input.document_url.as_deref())
        .bind(input.is_finalist)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(prom_id = %prom_id, quote_id = %row.id, category = %row.category, "quote added");
        Ok(row)
    }

    pub async fn update_quote(
        &self,
        prom_id: Uuid,
        quote_id: Uuid,
        input: &UpdateQuote,
    ) -> Result<QuoteRow, DbError> {
        sqlx::query_as::<_, QuoteRow>(
            r#"
            UPDATE prom_vendor_quotes SET
                category = COALESCE($3, category),
                vendor_name = COALESCE($4, vendor_name),
                price_total = COALESCE($5, price_total),
                price_per_student = COALESCE($6, price_per_student),
                description = COALESCE($7, description),
                contact_info = COALESCE($8, contact_info),
                document_url = COALESCE($9, document_url),
                is_selected = COALESCE($10, is_selected),
                updated_at = NOW()
            WHERE id = $1 AND prom_id = $2
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(prom_id)
        .bind(input.category.as_deref().map(str::trim))
        .bind(input.vendor_name.as_deref().map(str::trim))
        .bind(input.price_total)
        .bind(input.price_per_student)
        .bind(input.description.as_deref())
        .bind(input.contact_info.as_deref())
        .bind(input.document_url.as_deref())
        .bind(input.is_selected)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::PromQuote, quote_id))
    }

    pub async fn set_finalist(
        &self,
        prom_id: Uuid,
        quote_id: Uuid,
        is_finalist: bool,
    ) -> Result<QuoteRow, DbError> {
        sqlx::query_as::<_, QuoteRow>(
            r#"
            UPDATE prom_vendor_quotes SET is_finalist = $3, updated_at = NOW()
            WHERE id = $1 AND prom_id = $2
            RETURNING *
            "#,
        )
        .bind(quote_id)
        .bind(prom_id)
        .bind(is_finalist)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::PromQuote, quote_id))
    }

    pub async fn delete_quote(&self, prom_id: Uuid, quote_id: Uuid) -> Result<(), DbError> {
        let done = sqlx::query("DELETE FROM prom_vendor_quotes WHERE id = $1 AND prom_id = $2")
            .bind(quote_id)
            .bind(prom_id)
            .execute(self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::PromQuote, quote_id));
        }
        Ok(())
    }

    // -- votes --------------------------------------------------------------

    /// Insert or replace the voter's rating of a quote.
    ///
    /// Returns the vote and whether it was newly inserted.
    pub async fn upsert_vote(
        &self,
        prom_id: Uuid,
        quote_id: Uuid,
        voter_hash: &str,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<(VoteRow, bool), DbError> {
        #[derive(FromRow)]
        struct Upserted {
            #[sqlx(flatten)]
            vote: VoteRow,
            inserted: bool,
        }

        let row = sqlx::query_as::<_, Upserted>(
            r#"
            INSERT INTO prom_votes (prom_id, quote_id, voter_hash, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (quote_id, voter_hash) DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(prom_id)
        .bind(quote_id)
        .bind(voter_hash)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;

        Ok((row.vote, row.inserted))
    }

    pub async fn votes_by_voter(&self, prom_id: Uuid, voter_hash: &str) -> Result<Vec<VoteRow>, DbError> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT * FROM prom_votes WHERE prom_id = $1 AND voter_hash = $2 ORDER BY created_at",
        )
        .bind(prom_id)
        .bind(voter_hash)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Quotes and votes for the statistics reduce, fetched in two queries.
    pub async fn vote_inputs(&self, prom_id: Uuid) -> Result<(Vec<QuoteInfo>, Vec<VoteSample>), DbError> {
        let quotes = sqlx::query_as::<_, QuoteInfo>(
            "SELECT id, category, vendor_name, is_finalist FROM prom_vendor_quotes WHERE prom_id = $1",
        )
        .bind(prom_id)
        .fetch_all(self.pool)
        .await?;

        let votes = sqlx::query_as::<_, VoteSample>(
            "SELECT quote_id, voter_hash, rating FROM prom_votes WHERE prom_id = $1",
        )
        .bind(prom_id)
        .fetch_all(self.pool)
        .await?;

        Ok((quotes, votes))
    }

    // -- budget -------------------------------------------------------------

    pub async fn list_budget(&self, prom_id: Uuid) -> Result<Vec<BudgetItemRow>, DbError> {
        let rows = sqlx::query_as::<_, BudgetItemRow>(
            "SELECT * FROM prom_budget_items WHERE prom_id = $1 ORDER BY category, created_at",
        )
        .bind(prom_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn budget_lines(&self, prom_id: Uuid) -> Result<Vec<BudgetLine>, DbError> {
        let rows = sqlx::query_as::<_, BudgetLine>(
            r#"
            SELECT category, estimated_amount, actual_amount, is_paid
            FROM prom_budget_items
            WHERE prom_id = $1
            "#,
        )
        .bind(prom_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create_budget_item(
        &self,
        prom_id: Uuid,
        input: &CreateBudgetItem,
    ) -> Result<BudgetItemRow, DbError> {
        let row = sqlx::query_as::<_, BudgetItemRow>(
            r#"
            INSERT INTO prom_budget_items (
                prom_id, quote_id, category, description, estimated_amount, actual_amount, is_paid
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(prom_id)
        .bind(input.quote_id)
        .bind(input.category.trim())
        .bind(input.description.as_deref())
        .bind(input.estimated_amount)
        .bind(input.actual_amount)
        .bind(input.is_paid)
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_budget_item(
        &self,
        prom_id: Uuid,
        item_id: Uuid,
        input: &UpdateBudgetItem,
    ) -> Result<BudgetItemRow, DbError> {
        sqlx::query_as::<_, BudgetItemRow>(
            r#"
            UPDATE prom_budget_items SET
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                estimated_amount = COALESCE($5, estimated_amount),
                actual_amount = COALESCE($6, actual_amount),
                is_paid = COALESCE($7, is_paid),
                updated_at = NOW()
            WHERE id = $1 AND prom_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(prom_id)
        .bind(input.category.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.estimated_amount)
        .bind(input.actual_amount)
        .bind(input.is_paid)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::PromBudgetItem, item_id))
    }

    pub async fn delete_budget_item(&self, prom_id: Uuid, item_id: Uuid) -> Result<(), DbError> {
        let done = sqlx::query("DELETE FROM prom_budget_items WHERE id = $1 AND prom_id = $2")
            .bind(item_id)
            .bind(prom_id)
            .execute(self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::PromBudgetItem, item_id));
        }
        Ok(())
    }
}
