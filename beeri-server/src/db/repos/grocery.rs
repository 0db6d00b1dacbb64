//! Grocery list repository
//!
//! Lists are addressed by share token from the outside; item operations
//! always carry the list id so an item of another list cannot be touched.
//!
//! A partial claim is two statements: shrink the open row, then insert the
//! claimed row. They do not share a transaction. If the insert fails the
//! shrink is undone with a compensating update.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use crate::db::DbError;
use crate::models::grocery::{
    plan_claim, ClaimPlan, ClaimRejection, CreateGroceryList, GroceryStatus, NewGroceryItem,
    UpdateGroceryItem,
};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroceryListRow {
    pub id: Uuid,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub event_address: Option<String>,
    pub class_name: Option<String>,
    pub creator_name: Option<String>,
    pub notes: Option<String>,
    pub share_token: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GroceryListRow {
    pub fn is_active(&self) -> bool {
        self.status == GroceryStatus::Active.as_str()
    }
}

/// List row with item counters for the admin overview
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroceryListSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub list: GroceryListRow,
    pub item_count: i64,
    pub claimed_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroceryItemRow {
    pub id: Uuid,
    pub grocery_event_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub display_order: i32,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a claim attempt
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Claimed {
        /// The row now owned by the claimer
        claimed: GroceryItemRow,
        /// The open row left behind by a partial claim
        remainder: Option<GroceryItemRow>,
    },
    Rejected(ClaimRejection),
}

/// Grocery repository
pub struct GroceryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GroceryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All lists with item counters, newest first.
    pub async fn list_all(&self) -> Result<Vec<GroceryListSummary>, DbError> {
        let rows = sqlx::query_as::<_, GroceryListSummary>(
            r#"
            SELECT
                g.*,
                COUNT(i.id) AS item_count,
                COUNT(i.claimed_by) AS claimed_count
            FROM grocery_events g
            LEFT JOIN grocery_items i ON i.grocery_event_id = g.id
            GROUP BY g.id
            ORDER BY g.created_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Create the list and its initial items together.
    pub async fn create(
        &self,
        input: &CreateGroceryList,
        share_token: &str,
    ) -> Result<GroceryListRow, DbError> {
        let mut tx = self.pool.begin().await?;

        let list = sqlx::query_as::<_, GroceryListRow>(
            r#"
            INSERT INTO grocery_events (
                event_name, event_date, event_time, event_address,
                class_name, creator_name, notes, share_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.event_name.trim())
        .bind(input.event_date)
        .bind(input.event_time.as_deref())
        .bind(input.event_address.as_deref())
        .bind(input.class_name.as_deref())
        .bind(input.creator_name.as_deref())
        .bind(input.notes.as_deref())
        .bind(share_token)
        .fetch_one(&mut *tx)
        .await?;

        for (order, item) in input.items.iter().enumerate() {
            insert_item(&mut tx, list.id, item, order as i32).await?;
        }

        tx.commit().await?;
        tracing::info!(list_id = %list.id, items = input.items.len(), "grocery list created");
        Ok(list)
    }

    pub async fn get_by_token(&self, token: &str) -> Result<GroceryListRow, DbError> {
        sqlx::query_as::<_, GroceryListRow>("SELECT * FROM grocery_events WHERE share_token = $1")
            .bind(token)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::GroceryList, token))
    }

    pub async fn items(&self, list_id: Uuid) -> Result<Vec<GroceryItemRow>, DbError> {
        let rows = sqlx::query_as::<_, GroceryItemRow>(
            r#"
            SELECT * FROM grocery_items
            WHERE grocery_event_id = $1
            ORDER BY display_order, claimed_by NULLS FIRST, created_at
            "#,
        )
        .bind(list_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn set_status(&self, token: &str, status: GroceryStatus) -> Result<GroceryListRow, DbError> {
        sqlx::query_as::<_, GroceryListRow>(
            "UPDATE grocery_events SET status = $2, updated_at = NOW() WHERE share_token = $1 RETURNING *",
        )
        .bind(token)
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::GroceryList, token))
    }

    /// Append items after the current last position.
    pub async fn add_items(
        &self,
        list_id: Uuid,
        items: &[NewGroceryItem],
    ) -> Result<Vec<GroceryItemRow>, DbError> {
        let mut tx = self.pool.begin().await?;

        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM grocery_items WHERE grocery_event_id = $1",
        )
        .bind(list_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(items.len());
        for (offset, item) in items.iter().enumerate() {
            created.push(insert_item(&mut tx, list_id, item, next + offset as i32).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_item(&self, list_id: Uuid, item_id: Uuid) -> Result<GroceryItemRow, DbError> {
        sqlx::query_as::<_, GroceryItemRow>(
            "SELECT * FROM grocery_items WHERE id = $1 AND grocery_event_id = $2",
        )
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::GroceryItem, item_id))
    }

    pub async fn update_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        input: &UpdateGroceryItem,
    ) -> Result<GroceryItemRow, DbError> {
        sqlx::query_as::<_, GroceryItemRow>(
            r#"
            UPDATE grocery_items SET
                item_name = COALESCE($3, item_name),
                quantity = COALESCE($4, quantity),
                notes = COALESCE($5, notes),
                display_order = COALESCE($6, display_order),
                updated_at = NOW()
            WHERE id = $1 AND grocery_event_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .bind(input.item_name.as_deref().map(str::trim))
        .bind(input.quantity)
        .bind(input.notes.as_deref())
        .bind(input.display_order)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::GroceryItem, item_id))
    }

    pub async fn delete_item(&self, list_id: Uuid, item_id: Uuid) -> Result<(), DbError> {
        let done = sqlx::query("DELETE FROM grocery_items WHERE id = $1 AND grocery_event_id = $2")
            .bind(item_id)
            .bind(list_id)
            .execute(self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::GroceryItem, item_id));
        }
        Ok(())
    }

    /// Claim all or part of an open item.
    ///
    /// Each write is guarded on the state the plan was made from, so a
    /// concurrent claim turns into `Rejected(AlreadyClaimed)` instead of a
    /// double claim.
    pub async fn claim_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
        claimer: &str,
        requested: Option<i32>,
    ) -> Result<ClaimOutcome, DbError> {
        let item = self.get_item(list_id, item_id).await?;
        let plan = match plan_claim(item.quantity, item.claimed_by.is_some(), requested) {
            Ok(plan) => plan,
            Err(rejection) => return Ok(ClaimOutcome::Rejected(rejection)),
        };

        match plan {
            ClaimPlan::Full => {
                let claimed = sqlx::query_as::<_, GroceryItemRow>(
                    r#"
                    UPDATE grocery_items
                    SET claimed_by = $3, claimed_at = NOW(), updated_at = NOW()
                    WHERE id = $1 AND grocery_event_id = $2 AND claimed_by IS NULL
                    RETURNING *
                    "#,
                )
                .bind(item_id)
                .bind(list_id)
                .bind(claimer.trim())
                .fetch_optional(self.pool)
                .await?;

                Ok(match claimed {
                    Some(claimed) => ClaimOutcome::Claimed {
                        claimed,
                        remainder: None,
                    },
                    None => ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed),
                })
            }
            ClaimPlan::Split { remaining, claimed } => {
                let reduced = sqlx::query_as::<_, GroceryItemRow>(
                    r#"
                    UPDATE grocery_items SET quantity = $3, updated_at = NOW()
                    WHERE id = $1 AND grocery_event_id = $2
                      AND claimed_by IS NULL AND quantity = $4
                    RETURNING *
                    "#,
                )
                .bind(item_id)
                .bind(list_id)
                .bind(remaining)
                .bind(item.quantity)
                .fetch_optional(self.pool)
                .await?;

                let Some(reduced) = reduced else {
                    return Ok(ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed));
                };

                let inserted = sqlx::query_as::<_, GroceryItemRow>(
                    r#"
                    INSERT INTO grocery_items (
                        grocery_event_id, item_name, quantity, notes,
                        display_order, claimed_by, claimed_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, NOW())
                    RETURNING *
                    "#,
                )
                .bind(list_id)
                .bind(&item.item_name)
                .bind(claimed)
                .bind(item.notes.as_deref())
                .bind(item.display_order)
                .bind(claimer.trim())
                .fetch_one(self.pool)
                .await;

                match inserted {
                    Ok(row) => {
                        tracing::info!(
                            list_id = %list_id,
                            item_id = %item_id,
                            claimed,
                            remaining,
                            "partial claim"
                        );
                        Ok(ClaimOutcome::Claimed {
                            claimed: row,
                            remainder: Some(reduced),
                        })
                    }
                    Err(e) => {
                        self.restore_quantity(item_id, claimed).await;
                        Err(e.into())
                    }
                }
            }
        }
    }

    async fn restore_quantity(&self, item_id: Uuid, amount: i32) {
        let reverted = sqlx::query(
            "UPDATE grocery_items SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(item_id)
        .bind(amount)
        .execute(self.pool)
        .await;

        match reverted {
            Ok(_) => tracing::warn!(item_id = %item_id, amount, "partial claim reverted"),
            Err(e) => tracing::error!(
                item_id = %item_id,
                amount,
                error = %e,
                "failed to revert partial claim, item quantity is short"
            ),
        }
    }

    /// Release a claim. `Ok(None)` when the item exists but is not claimed.
    pub async fn unclaim_item(
        &self,
        list_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<GroceryItemRow>, DbError> {
        let released = sqlx::query_as::<_, GroceryItemRow>(
            r#"
            UPDATE grocery_items
            SET claimed_by = NULL, claimed_at = NULL, updated_at = NOW()
            WHERE id = $1 AND grocery_event_id = $2 AND claimed_by IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(list_id)
        .fetch_optional(self.pool)
        .await?;

        match released {
            Some(row) => Ok(Some(row)),
            None => self.get_item(list_id, item_id).await.map(|_| None),
        }
    }
}

async fn insert_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    list_id: Uuid,
    item: &NewGroceryItem,
    display_order: i32,
) -> Result<GroceryItemRow, DbError> {
    let row = sqlx::query_as::<_, GroceryItemRow>(
        r#"
        INSERT INTO grocery_items (grocery_event_id, item_name, quantity, notes, display_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(list_id)
    .bind(item.item_name.trim())
    .bind(item.quantity)
    .bind(item.notes.as_deref())
    .bind(display_order)
    .fetch_one(&mut **tx)
    .await?;
    Ok(row)
}
