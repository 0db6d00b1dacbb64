//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Uses JOINs and aggregates for list operations (no N+1)
//! - Relies on unique constraints and ON CONFLICT (no check-then-insert)
//! - Uses transactions where rows must appear together
//! - Partial updates through COALESCE so absent fields keep their value

pub mod community;
pub mod directory;
pub mod events;
pub mod grocery;
pub mod maintenance;
pub mod prom;
pub mod protocols;
pub mod push;
pub mod tags;
pub mod tasks;

pub use community::{FeedbackRepo, FeedbackRow, IdeaRepo, IdeaRow, SkillRepo, SkillResponseRow};
pub use directory::{
    CommitteeRepo, CommitteeRow, HighlightRepo, HighlightRow, TicketRepo, TicketRow, VendorRepo,
    VendorRow,
};
pub use events::{EventRepo, EventRow};
pub use grocery::{ClaimOutcome, GroceryItemRow, GroceryListRow, GroceryListSummary, GroceryRepo};
pub use maintenance::MaintenanceRepo;
pub use prom::{BudgetItemRow, PromEventRow, PromRepo, QuoteRow, VoteRow};
pub use protocols::{ProtocolRepo, ProtocolRow};
pub use push::{NotificationRow, PushRepo, SubscriptionRow};
pub use tags::{TagRef, TagRepo, TagRow, TagWithUsage};
pub use tasks::{TaskRepo, TaskRow};

use beeri_core::Resource;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;
use crate::models::{Paginated, Pagination};

/// A row plus the `COUNT(*) OVER()` total of its result set
#[derive(Debug, FromRow)]
pub(crate) struct Counted<T> {
    #[sqlx(flatten)]
    pub row: T,
    pub total: i64,
}

pub(crate) fn paginate<T>(rows: Vec<Counted<T>>, page: Pagination) -> Paginated<T> {
    let total = rows.first().map(|r| r.total).unwrap_or(0);
    Paginated::from_rows(rows.into_iter().map(|r| r.row).collect(), total, page)
}

/// Tables whose deletes go through the audit trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditedTable {
    Tasks,
    Protocols,
    Vendors,
}

impl AuditedTable {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Protocols => "protocols",
            Self::Vendors => "vendors",
        }
    }

    pub fn resource(&self) -> Resource {
        match self {
            Self::Tasks => Resource::Task,
            Self::Protocols => Resource::Protocol,
            Self::Vendors => Resource::Vendor,
        }
    }
}

/// Result of a bulk delete
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BulkDeleteReport {
    pub deleted: Vec<Uuid>,
    pub missing: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl BulkDeleteReport {
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Delete one id at a time so the row trigger writes one audit entry per
/// row. A failing id is reported and the loop moves on.
pub(crate) async fn delete_each(
    pool: &PgPool,
    table: AuditedTable,
    ids: &[Uuid],
) -> BulkDeleteReport {
    let sql = format!("DELETE FROM {} WHERE id = $1", table.table());
    let mut report = BulkDeleteReport::default();

    for id in dedup(ids) {
        match sqlx::query(&sql).bind(id).execute(pool).await {
            Ok(done) if done.rows_affected() == 0 => report.missing.push(id),
            Ok(_) => report.deleted.push(id),
            Err(e) => {
                tracing::warn!(table = table.table(), %id, error = %e, "bulk delete row failed");
                report.failed.push(id);
            }
        }
    }

    tracing::info!(
        table = table.table(),
        deleted = report.deleted.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "bulk delete finished"
    );
    report
}

/// Single-row delete that reports a missing row as `NotFound`.
pub(crate) async fn delete_by_id(
    pool: &PgPool,
    table: &'static str,
    resource: Resource,
    id: Uuid,
) -> Result<(), DbError> {
    let done = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;
    if done.rows_affected() == 0 {
        return Err(DbError::not_found(resource, id));
    }
    Ok(())
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup(&[a, b, a, b, a]), vec![a, b]);
    }

    #[test]
    fn audited_tables_match_migrations() {
        for table in [AuditedTable::Tasks, AuditedTable::Protocols, AuditedTable::Vendors] {
            assert!(crate::db::migrations::AUDITED_TABLES.contains(&table.table()));
        }
    }

    #[test]
    fn report_serializes_id_lists() {
        let id = Uuid::nil();
        let report = BulkDeleteReport {
            deleted: vec![id],
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["deleted"][0], id.to_string());
        assert_eq!(json["failed"].as_array().unwrap().len(), 0);
    }
}
