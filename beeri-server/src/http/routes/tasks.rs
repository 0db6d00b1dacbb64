//! Task endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, patch, post, put};
use axum::Router;
use beeri_core::clock::israel_today;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{BulkDeleteReport, TaskRepo, TaskRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::extractors::{AdminSession, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::task::{
    BulkDelete, ChangeTaskStatus, CreateTask, SetTaskTags, TaskFilter, UpdateTask,
};

/// GET /api/tasks
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<TaskFilter>,
) -> ApiResult<Vec<TaskRow>> {
    let tasks = TaskRepo::new(&state.pool)
        .list(&filter, israel_today())
        .await?;
    Ok(ok(tasks))
}

/// GET /api/tasks/{id}
async fn get_task(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<TaskRow> {
    Ok(ok(TaskRepo::new(&state.pool).get(id).await?))
}

/// POST /api/tasks
async fn create_task(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateTask>,
) -> Created<TaskRow> {
    let task = TaskRepo::new(&state.pool).create(&input).await?;
    tracing::info!(task_id = %task.id, "task created");
    Ok(created(task))
}

/// PUT /api/tasks/{id}
async fn update_task(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateTask>,
) -> ApiResult<TaskRow> {
    Ok(ok(TaskRepo::new(&state.pool).update(id, &input).await?))
}

/// PATCH /api/tasks/{id}/status
async fn change_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<ChangeTaskStatus>,
) -> ApiResult<TaskRow> {
    let task = TaskRepo::new(&state.pool).set_status(id, input.status).await?;
    Ok(ok(task))
}

/// PUT /api/tasks/{id}/tags - replaces the whole tag set
async fn set_tags(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<SetTaskTags>,
) -> ApiResult<TaskRow> {
    let task = TaskRepo::new(&state.pool).set_tags(id, &input.tag_ids).await?;
    Ok(ok(task))
}

/// DELETE /api/tasks/{id}
async fn delete_task(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    TaskRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

/// POST /api/tasks/bulk-delete
#[instrument(skip_all)]
async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<BulkDelete>,
) -> ApiResult<BulkDeleteReport> {
    let report = TaskRepo::new(&state.pool).bulk_delete(&input.ids).await;
    Ok(ok(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/bulk-delete", post(bulk_delete))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/status", patch(change_status))
        .route("/tasks/{id}/tags", put(set_tags))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{post_json, request_json};
    use axum::http::StatusCode;

    const TASK: &str = "/api/tasks/0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d";

    #[tokio::test]
    async fn mutations_require_admin() {
        for (method, uri, body) in [
            ("POST", "/api/tasks", r#"{"title":"x"}"#),
            ("PUT", TASK, r#"{"title":"x"}"#),
            ("PATCH", "/api/tasks/0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d/status", r#"{"status":"done"}"#),
            ("PUT", "/api/tasks/0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d/tags", r#"{"tag_ids":[]}"#),
            ("DELETE", TASK, ""),
            ("POST", "/api/tasks/bulk-delete", r#"{"ids":[]}"#),
        ] {
            let (status, _) = request_json(method, uri, body, false).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn empty_bulk_delete_is_rejected() {
        let (status, body) = post_json("/api/tasks/bulk-delete", r#"{"ids":[]}"#, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("ids:"));
    }

    #[tokio::test]
    async fn bad_phone_is_rejected() {
        let (status, body) = post_json(
            "/api/tasks",
            r#"{"title":"לקנות שתייה","owner_phone":"call me"}"#,
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("owner_phone:"));
    }
}
