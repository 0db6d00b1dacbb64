//! Parent-submitted content: anonymous feedback, ideas and skill survey
//! responses. Anyone may insert; only admins read.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use beeri_core::Resource;

use super::{delete_by_id, paginate, Counted};
use crate::db::DbError;
use crate::models::community::{FeedbackStatus, ReviewIdea, SubmitFeedback, SubmitIdea, SubmitSkills};
use crate::models::{Paginated, Pagination};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub message: String,
    pub category: String,
    pub rating: Option<i16>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct FeedbackRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> FeedbackRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, input: &SubmitFeedback) -> Result<FeedbackRow, DbError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "INSERT INTO anonymous_feedback (message, category, rating) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(input.message.trim())
        .bind(input.category.trim())
        .bind(input.rating)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(feedback_id = %row.id, category = %row.category, "feedback received");
        Ok(row)
    }

    pub async fn list(
        &self,
        status: Option<FeedbackStatus>,
        page: Pagination,
    ) -> Result<Paginated<FeedbackRow>, DbError> {
        let rows = sqlx::query_as::<_, Counted<FeedbackRow>>(
            r#"
            SELECT f.*, COUNT(*) OVER() AS total
            FROM anonymous_feedback f
            WHERE $1::text IS NULL OR f.status = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }

    pub async fn set_status(&self, id: Uuid, status: FeedbackStatus) -> Result<FeedbackRow, DbError> {
        sqlx::query_as::<_, FeedbackRow>(
            "UPDATE anonymous_feedback SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Feedback, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "anonymous_feedback", Resource::Feedback, id).await
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IdeaRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub submitter_name: Option<String>,
    pub status: String,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct IdeaRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> IdeaRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, input: &SubmitIdea) -> Result<IdeaRow, DbError> {
        let row = sqlx::query_as::<_, IdeaRow>(
            r#"
            INSERT INTO ideas (title, description, category, submitter_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.category.as_deref())
        .bind(input.submitter_name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .fetch_one(self.pool)
        .await?;

        tracing::info!(idea_id = %row.id, "idea submitted");
        Ok(row)
    }

    pub async fn list(&self, page: Pagination) -> Result<Paginated<IdeaRow>, DbError> {
        let rows = sqlx::query_as::<_, Counted<IdeaRow>>(
            r#"
            SELECT i.*, COUNT(*) OVER() AS total
            FROM ideas i
            ORDER BY i.created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }

    /// Set status; notes are replaced only when given.
    pub async fn review(&self, id: Uuid, input: &ReviewIdea) -> Result<IdeaRow, DbError> {
        sqlx::query_as::<_, IdeaRow>(
            r#"
            UPDATE ideas SET
                status = $2,
                admin_notes = COALESCE($3, admin_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.status.as_str())
        .bind(input.admin_notes.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found(Resource::Idea, id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "ideas", Resource::Idea, id).await
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SkillResponseRow {
    pub id: Uuid,
    pub parent_name: Option<String>,
    pub child_name: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub other_skill: Option<String>,
    pub preferred_contact: String,
    pub created_at: DateTime<Utc>,
}

pub struct SkillRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SkillRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(&self, input: &SubmitSkills) -> Result<SkillResponseRow, DbError> {
        let row = sqlx::query_as::<_, SkillResponseRow>(
            r#"
            INSERT INTO parent_skill_responses (
                parent_name, child_name, phone, skills, other_skill, preferred_contact
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.parent_name.as_deref())
        .bind(input.child_name.as_deref())
        .bind(input.phone.as_deref())
        .bind(&input.skills)
        .bind(input.other_skill.as_deref())
        .bind(input.preferred_contact.as_str())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(response_id = %row.id, skills = row.skills.len(), "skill survey response");
        Ok(row)
    }

    /// Filter by a single skill when given.
    pub async fn list(
        &self,
        skill: Option<&str>,
        page: Pagination,
    ) -> Result<Paginated<SkillResponseRow>, DbError> {
        let rows = sqlx::query_as::<_, Counted<SkillResponseRow>>(
            r#"
            SELECT s.*, COUNT(*) OVER() AS total
            FROM parent_skill_responses s
            WHERE $1::text IS NULL OR $1 = ANY(s.skills)
            ORDER BY s.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(skill)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(paginate(rows, page))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        delete_by_id(self.pool, "parent_skill_responses", Resource::SkillResponse, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::community::{ContactPreference, IdeaStatus};

    #[tokio::test]
    #[ignore = "requires database"]
    async fn feedback_lifecycle() {
        let pool = test_pool().await;
        let repo = FeedbackRepo::new(&pool);
        let row = repo
            .submit(&SubmitFeedback {
                message: "תודה על הטיול".into(),
                category: "general".into(),
                rating: Some(5),
            })
            .await
            .unwrap();
        assert_eq!(row.status, "new");

        let reviewed = repo.set_status(row.id, FeedbackStatus::Reviewed).await.unwrap();
        assert_eq!(reviewed.status, "reviewed");

        repo.delete(row.id).await.unwrap();
        assert!(matches!(repo.delete(row.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn idea_review_keeps_notes_when_absent() {
        let pool = test_pool().await;
        let repo = IdeaRepo::new(&pool);
        let idea = repo
            .submit(&SubmitIdea {
                title: "ערב סרט".into(),
                description: None,
                category: None,
                submitter_name: Some("  ".into()),
            })
            .await
            .unwrap();
        assert!(idea.submitter_name.is_none());

        repo.review(
            idea.id,
            &ReviewIdea {
                status: IdeaStatus::UnderReview,
                admin_notes: Some("לבדוק מחיר".into()),
            },
        )
        .await
        .unwrap();
        let approved = repo
            .review(
                idea.id,
                &ReviewIdea {
                    status: IdeaStatus::Approved,
                    admin_notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(approved.status, "approved");
        assert_eq!(approved.admin_notes.as_deref(), Some("לבדוק מחיר"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn skills_filter_matches_array_member() {
        let pool = test_pool().await;
        let repo = SkillRepo::new(&pool);
        let row = repo
            .submit(&SubmitSkills {
                parent_name: Some("מיכל".into()),
                child_name: None,
                phone: None,
                skills: vec!["photography".into(), "baking".into()],
                other_skill: None,
                preferred_contact: ContactPreference::Whatsapp,
            })
            .await
            .unwrap();

        let page = repo.list(Some("baking"), Pagination::new(1, 100)).await.unwrap();
        assert!(page.items.iter().any(|r| r.id == row.id));
        assert!(page.items.iter().all(|r| r.skills.iter().any(|s| s == "baking")));
    }
}
