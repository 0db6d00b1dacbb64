//! Tag endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, put};
use axum::Router;
use uuid::Uuid;

use crate::db::{TagRepo, TagRow, TagWithUsage};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::extractors::{AdminSession, ValidJson, ValidPath};
use crate::http::server::AppState;
use crate::models::tag::{CreateTag, UpdateTag};

/// GET /api/tags - with the number of tasks using each tag
async fn list_tags(State(state): State<Arc<AppState>>) -> ApiResult<Vec<TagWithUsage>> {
    Ok(ok(TagRepo::new(&state.pool).list().await?))
}

/// POST /api/tags - a taken name is a 400, nothing is inserted
async fn create_tag(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateTag>,
) -> Created<TagRow> {
    let tag = TagRepo::new(&state.pool).create(&input).await?;
    Ok(created(tag))
}

async fn update_tag(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateTag>,
) -> ApiResult<TagRow> {
    Ok(ok(TagRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_tag(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    TagRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route("/tags/{id}", put(update_tag).delete(delete_tag))
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::post_json;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn create_requires_admin() {
        let (status, _) = post_json("/api/tags", r#"{"name":"דחוף"}"#, false).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_color_is_rejected() {
        let (status, body) =
            post_json("/api/tags", r##"{"name":"דחוף","color":"red"}"##, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("color:"));
    }
}
