//! Whole-table access for the maintenance commands (backup, verify,
//! token backfill). Table names come from `migrations::TABLES`, never from
//! user input.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::migrations::TABLES;
use crate::db::DbError;

pub struct MaintenanceRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> MaintenanceRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn known(table: &str) -> Option<&'static str> {
        TABLES.iter().copied().find(|t| *t == table)
    }

    /// Every row of `table` as a JSON array.
    pub async fn export_table(&self, table: &str) -> Result<Value, DbError> {
        let Some(table) = Self::known(table) else {
            return Ok(Value::Array(Vec::new()));
        };
        let (rows,): (Value,) = sqlx::query_as(&format!(
            "SELECT COALESCE(json_agg(t), '[]'::json) FROM {table} t"
        ))
        .fetch_one(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64, DbError> {
        let Some(table) = Self::known(table) else {
            return Ok(0);
        };
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    pub async fn events_without_edit_token(&self) -> Result<Vec<Uuid>, DbError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE edit_token IS NULL")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Returns false when the row already had a token.
    pub async fn set_edit_token(&self, id: Uuid, token: &str) -> Result<bool, DbError> {
        let done = sqlx::query("UPDATE events SET edit_token = $2 WHERE id = $1 AND edit_token IS NULL")
            .bind(id)
            .bind(token)
            .execute(self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn grocery_lists_without_share_token(&self) -> Result<Vec<Uuid>, DbError> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM grocery_events WHERE share_token IS NULL")
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn set_share_token(&self, id: Uuid, token: &str) -> Result<bool, DbError> {
        let done = sqlx::query(
            "UPDATE grocery_events SET share_token = $2 WHERE id = $1 AND share_token IS NULL",
        )
        .bind(id)
        .bind(token)
        .execute(self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }
}
