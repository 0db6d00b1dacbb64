//! Parent submissions: anonymous feedback, ideas and the skills survey
//!
//! Anyone may submit; reading and moderation need an admin session.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, patch};
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{FeedbackRepo, FeedbackRow, IdeaRepo, IdeaRow, SkillRepo, SkillResponseRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::extractors::{AdminSession, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::community::{
    ChangeFeedbackStatus, FeedbackStatus, ReviewIdea, SubmitFeedback, SubmitIdea, SubmitSkills,
};
use crate::models::{Paginated, Pagination, PaginationParams};

// flattened PaginationParams cannot parse numbers out of a query string
#[derive(Debug, Default, Deserialize)]
struct FeedbackQuery {
    status: Option<FeedbackStatus>,
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillQuery {
    skill: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}


// -- feedback ---------------------------------------------------------------

/// POST /api/feedback - anonymous, no session needed
async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<SubmitFeedback>,
) -> Created<FeedbackRow> {
    let row = FeedbackRepo::new(&state.pool).submit(&input).await?;
    tracing::info!(feedback_id = %row.id, "feedback received");
    Ok(created(row))
}

async fn list_feedback(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidQuery(query): ValidQuery<FeedbackQuery>,
) -> ApiResult<Paginated<FeedbackRow>> {
    let page = Pagination::from_query(query.page, query.per_page)?;
    Ok(ok(FeedbackRepo::new(&state.pool).list(query.status, page).await?))
}

async fn change_feedback_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<ChangeFeedbackStatus>,
) -> ApiResult<FeedbackRow> {
    Ok(ok(FeedbackRepo::new(&state.pool).set_status(id, input.status).await?))
}

async fn delete_feedback(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    FeedbackRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

// -- ideas ------------------------------------------------------------------

async fn submit_idea(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<SubmitIdea>,
) -> Created<IdeaRow> {
    Ok(created(IdeaRepo::new(&state.pool).submit(&input).await?))
}

async fn list_ideas(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> ApiResult<Paginated<IdeaRow>> {
    let page = Pagination::try_from(params)?;
    Ok(ok(IdeaRepo::new(&state.pool).list(page).await?))
}

async fn review_idea(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<ReviewIdea>,
) -> ApiResult<IdeaRow> {
    Ok(ok(IdeaRepo::new(&state.pool).review(id, &input).await?))
}

async fn delete_idea(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    IdeaRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

// -- skills survey ----------------------------------------------------------

async fn submit_skills(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<SubmitSkills>,
) -> Created<SkillResponseRow> {
    Ok(created(SkillRepo::new(&state.pool).submit(&input).await?))
}

async fn list_skills(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidQuery(query): ValidQuery<SkillQuery>,
) -> ApiResult<Paginated<SkillResponseRow>> {
    let page = Pagination::from_query(query.page, query.per_page)?;
    let skill = query.skill.as_deref().filter(|s| !s.trim().is_empty());
    Ok(ok(SkillRepo::new(&state.pool).list(skill, page).await?))
}

async fn delete_skills(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    SkillRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/feedback", get(list_feedback).post(submit_feedback))
        .route(
            "/feedback/{id}",
            patch(change_feedback_status).delete(delete_feedback),
        )
        .route("/ideas", get(list_ideas).post(submit_idea))
        .route("/ideas/{id}", patch(review_idea).delete(delete_idea))
        .route("/skills", get(list_skills).post(submit_skills))
        .route("/skills/{id}", delete(delete_skills))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{get, post_json, request_json};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn listing_requires_admin() {
        for uri in ["/api/feedback", "/api/ideas", "/api/skills"] {
            let (status, _) = get(uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn moderation_requires_admin() {
        let (status, _) = request_json(
            "PATCH",
            "/api/feedback/0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d",
            r#"{"status":"reviewed"}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_feedback_is_rejected_before_the_database() {
        let (status, body) = post_json("/api/feedback", r#"{"message":"   "}"#, false).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn admin_lists_reject_huge_page() {
        for uri in [
            "/api/feedback?page=4294967295",
            "/api/ideas?page=4294967295",
            "/api/skills?page=4294967295&per_page=100",
        ] {
            let (status, body) = request_json("GET", uri, "", true).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "validation_error", "{uri}");
        }
    }
}
