//! Task repository
//!
//! Tasks are listed with their tags aggregated in the same query. Deletes go
//! through the audit trigger, so bulk deletes run one row at a time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::tags::TagRef;
use super::{delete_by_id, delete_each, AuditedTable, BulkDeleteReport};
use crate::db::DbError;
use crate::models::task::{CreateTask, TaskFilter, TaskStatus, UpdateTask};

/// Task record with its tags
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub event_id: Option<Uuid>,
    pub committee_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Json<Vec<TagRef>>,
}

impl TaskRow {
    /// Overdue: due before `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        let open = !matches!(self.status.as_str(), "done" | "cancelled");
        open && self.due_date.is_some_and(|due| due < today)
    }
}

const SELECT_WITH_TAGS: &str = r#"
    SELECT
        t.*,
        COALESCE(
            json_agg(
                json_build_object('id', g.id, 'name', g.name, 'color', g.color, 'emoji', g.emoji)
                ORDER BY g.name
            ) FILTER (WHERE g.id IS NOT NULL),
            '[]'
        ) AS tags
    FROM tasks t
    LEFT JOIN task_tags tt ON tt.task_id = t.id
    LEFT JOIN tags g ON g.id = tt.tag_id
"#;

/// Task repository
pub struct TaskRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> TaskRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List tasks with tags. `today` is the Israel calendar date used for
    /// the overdue filter.
    pub async fn list(&self, filter: &TaskFilter, today: NaiveDate) -> Result<Vec<TaskRow>, DbError> {
        let sql = format!(
            r#"
            {SELECT_WITH_TAGS}
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::uuid IS NULL OR t.event_id = $2)
              AND ($3::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM task_tags x WHERE x.task_id = t.id AND x.tag_id = $3))
              AND (NOT $4 OR (t.due_date < $5 AND t.status NOT IN ('done', 'cancelled')))
            GROUP BY t.id
            ORDER BY t.due_date ASC NULLS LAST, t.created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.event_id)
            .bind(filter.tag_id)
            .bind(filter.overdue)
            .bind(today)
            .fetch_all(self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<TaskRow, DbError> {
        let sql = format!("{SELECT_WITH_TAGS} WHERE t.id = $1 GROUP BY t.id");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found(Resource::Task, id))
    }

    /// Insert a task and its tag links together.
    pub async fn create(&self, input: &CreateTask) -> Result<TaskRow, DbError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO tasks (
                title, description, status, priority, due_date,
                owner_name, owner_phone, event_id, committee_id, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                    CASE WHEN $3 = 'done' THEN NOW() END)
            RETURNING id
            "#,
        )
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.status.as_str())
        .bind(input.priority.as_str())
        .bind(input.due_date)
        .bind(input.owner_name.as_deref())
        .bind(input.owner_phone.as_deref())
        .bind(input.event_id)
        .bind(input.committee_id)
        .fetch_one(&mut *tx)
        .await?;

        if !input.tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO task_tags (task_id, tag_id) \
                 SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(&input.tag_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(task_id = %id, tags = input.tag_ids.len(), "task created");
        self.get(id).await
    }

    pub async fn update(&self, id: Uuid, input: &UpdateTask) -> Result<TaskRow, DbError> {
        let updated = sqlx::query(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                owner_name = COALESCE($7, owner_name),
                owner_phone = COALESCE($8, owner_phone),
                event_id = COALESCE($9, event_id),
                committee_id = COALESCE($10, committee_id),
                completed_at = CASE
                    WHEN COALESCE($4, status) = 'done' THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.priority.map(|p| p.as_str()))
        .bind(input.due_date)
        .bind(input.owner_name.as_deref())
        .bind(input.owner_phone.as_deref())
        .bind(input.event_id)
        .bind(input.committee_id)
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::Task, id));
        }
        self.get(id).await
    }

    /// Move a task to another status; `completed_at` follows `done`.
    pub async fn set_status(&self, id: Uuid, status: TaskStatus) -> Result<TaskRow, DbError> {
        self.update(
            id,
            &UpdateTask {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Replace the task's tag set.
    pub async fn set_tags(&self, id: Uuid, tag_ids: &[Uuid]) -> Result<TaskRow, DbError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE tasks SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(DbError::not_found(Resource::Task, id));
        }

        sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if !tag_ids.is_empty() {
            sqlx::query(
                "INSERT INTO task_tags (task_id, tag_id) \
                 SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(tag_ids)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "tasks", Resource::Task, id).await
    }

    pub async fn bulk_delete(&self, ids: &[Uuid]) -> BulkDeleteReport {
        delete_each(self.pool, AuditedTable::Tasks, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::TagRepo;
    use crate::db::test_pool;
    use crate::models::tag::CreateTag;
    use crate::models::task::TaskPriority;

    fn task(title: &str) -> CreateTask {
        CreateTask {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Normal,
            due_date: None,
            owner_name: None,
            owner_phone: None,
            event_id: None,
            committee_id: None,
            tag_ids: Vec::new(),
        }
    }

    fn row(status: &str, due: Option<NaiveDate>) -> TaskRow {
        let now = Utc::now();
        TaskRow {
            id: Uuid::nil(),
            title: "t".into(),
            description: None,
            status: status.into(),
            priority: "normal".into(),
            due_date: due,
            owner_name: None,
            owner_phone: None,
            event_id: None,
            committee_id: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            tags: Json(Vec::new()),
        }
    }

    #[test]
    fn overdue_needs_open_status_and_past_due() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let yesterday = today.pred_opt().unwrap();

        assert!(row("todo", Some(yesterday)).is_overdue(today));
        assert!(row("blocked", Some(yesterday)).is_overdue(today));
        assert!(!row("todo", Some(today)).is_overdue(today));
        assert!(!row("done", Some(yesterday)).is_overdue(today));
        assert!(!row("cancelled", Some(yesterday)).is_overdue(today));
        assert!(!row("todo", None).is_overdue(today));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_with_tags_and_replace_them() {
        let pool = test_pool().await;
        let tags = TagRepo::new(&pool);
        let a = tags
            .create(&CreateTag {
                name: format!("a-{}", Uuid::new_v4().simple()),
                color: "#000000".into(),
                emoji: None,
            })
            .await
            .unwrap();
        let b = tags
            .create(&CreateTag {
                name: format!("b-{}", Uuid::new_v4().simple()),
                color: "#ffffff".into(),
                emoji: Some("🎈".into()),
            })
            .await
            .unwrap();

        let repo = TaskRepo::new(&pool);
        let mut input = task("להזמין בלונים");
        input.tag_ids = vec![a.id];
        let created = repo.create(&input).await.unwrap();
        assert_eq!(created.tags.0.len(), 1);

        let replaced = repo.set_tags(created.id, &[b.id]).await.unwrap();
        assert_eq!(replaced.tags.0, vec![TagRef {
            id: b.id,
            name: b.name.clone(),
            color: b.color.clone(),
            emoji: b.emoji.clone(),
        }]);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn done_sets_completed_at_and_reopen_clears_it() {
        let pool = test_pool().await;
        let repo = TaskRepo::new(&pool);
        let created = repo.create(&task("לסדר כיסאות")).await.unwrap();

        let done = repo.set_status(created.id, TaskStatus::Done).await.unwrap();
        assert!(done.completed_at.is_some());

        let reopened = repo.set_status(created.id, TaskStatus::Todo).await.unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn bulk_delete_writes_one_audit_row_per_task() {
        let pool = test_pool().await;
        let repo = TaskRepo::new(&pool);
        let first = repo.create(&task("א")).await.unwrap();
        let second = repo.create(&task("ב")).await.unwrap();
        let ghost = Uuid::new_v4();

        let report = repo.bulk_delete(&[first.id, second.id, ghost]).await;
        assert_eq!(report.deleted, vec![first.id, second.id]);
        assert_eq!(report.missing, vec![ghost]);
        assert!(report.failed.is_empty());

        let (audited,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM audit_log WHERE table_name = 'tasks' AND row_id = ANY($1)",
        )
        .bind(vec![first.id, second.id])
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(audited, 2);
    }
}
