//! Meeting protocol endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use beeri_core::Resource;
use uuid::Uuid;

use crate::db::{BulkDeleteReport, ProtocolRepo, ProtocolRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminSession, MaybeAdmin, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::protocol::{CreateProtocol, UpdateProtocol};
use crate::models::task::BulkDelete;
use crate::models::{Paginated, Pagination, PaginationParams};

/// GET /api/protocols - public callers see public protocols only
async fn list_protocols(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidQuery(params): ValidQuery<PaginationParams>,
) -> ApiResult<Paginated<ProtocolRow>> {
    let window = Pagination::try_from(params)?;
    let page = ProtocolRepo::new(&state.pool).list(window, is_admin).await?;
    Ok(ok(page))
}

async fn get_protocol(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<ProtocolRow> {
    let protocol = ProtocolRepo::new(&state.pool).get(id).await?;
    if !protocol.is_public && !is_admin {
        return Err(ApiError::NotFound(Resource::Protocol));
    }
    Ok(ok(protocol))
}

async fn create_protocol(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateProtocol>,
) -> Created<ProtocolRow> {
    let protocol = ProtocolRepo::new(&state.pool).create(&input).await?;
    tracing::info!(protocol_id = %protocol.id, "protocol created");
    Ok(created(protocol))
}

async fn update_protocol(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateProtocol>,
) -> ApiResult<ProtocolRow> {
    Ok(ok(ProtocolRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_protocol(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    ProtocolRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

/// POST /api/protocols/bulk-delete - one DELETE per row for the audit log
async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<BulkDelete>,
) -> ApiResult<BulkDeleteReport> {
    Ok(ok(ProtocolRepo::new(&state.pool).bulk_delete(&input.ids).await))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/protocols", get(list_protocols).post(create_protocol))
        .route("/protocols/bulk-delete", post(bulk_delete))
        .route(
            "/protocols/{id}",
            get(get_protocol).put(update_protocol).delete(delete_protocol),
        )
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{get, post_json};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn bulk_delete_requires_admin() {
        let (status, _) = post_json(
            "/api/protocols/bulk-delete",
            r#"{"ids":["0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d"]}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_numeric_page_is_400() {
        let (status, body) = get("/api/protocols?page=first").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn page_past_limit_is_400_before_query() {
        let (status, body) = get("/api/protocols?page=4294967295&per_page=100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["details"][0].as_str().unwrap().starts_with("page:"));
    }
}
