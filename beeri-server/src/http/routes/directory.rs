//! Committees, vendors, tickets and homepage highlights
//!
//! Plain CRUD: reads are public, writes need an admin session.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use beeri_core::Resource;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::{
    BulkDeleteReport, CommitteeRepo, CommitteeRow, HighlightRepo, HighlightRow, TicketRepo,
    TicketRow, VendorRepo, VendorRow,
};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminSession, MaybeAdmin, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::directory::{
    CreateCommittee, CreateHighlight, CreateTicket, CreateVendor, TicketStatus, UpdateCommittee,
    UpdateHighlight, UpdateTicket, UpdateVendor,
};
use crate::models::task::BulkDelete;

// -- committees -------------------------------------------------------------

async fn list_committees(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CommitteeRow>> {
    Ok(ok(CommitteeRepo::new(&state.pool).list().await?))
}

async fn get_committee(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<CommitteeRow> {
    Ok(ok(CommitteeRepo::new(&state.pool).get(id).await?))
}

async fn create_committee(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateCommittee>,
) -> Created<CommitteeRow> {
    Ok(created(CommitteeRepo::new(&state.pool).create(&input).await?))
}

async fn update_committee(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateCommittee>,
) -> ApiResult<CommitteeRow> {
    Ok(ok(CommitteeRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_committee(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    CommitteeRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

// -- vendors ----------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct VendorQuery {
    category: Option<String>,
}

async fn list_vendors(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<VendorQuery>,
) -> ApiResult<Vec<VendorRow>> {
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    Ok(ok(VendorRepo::new(&state.pool).list(category).await?))
}

async fn get_vendor(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<VendorRow> {
    Ok(ok(VendorRepo::new(&state.pool).get(id).await?))
}

async fn create_vendor(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateVendor>,
) -> Created<VendorRow> {
    Ok(created(VendorRepo::new(&state.pool).create(&input).await?))
}

async fn update_vendor(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateVendor>,
) -> ApiResult<VendorRow> {
    Ok(ok(VendorRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_vendor(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    VendorRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

async fn bulk_delete_vendors(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<BulkDelete>,
) -> ApiResult<BulkDeleteReport> {
    Ok(ok(VendorRepo::new(&state.pool).bulk_delete(&input.ids).await))
}

// -- tickets ----------------------------------------------------------------

async fn list_tickets(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
) -> ApiResult<Vec<TicketRow>> {
    Ok(ok(TicketRepo::new(&state.pool).list(is_admin).await?))
}

async fn get_ticket(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<TicketRow> {
    let ticket = TicketRepo::new(&state.pool).get(id).await?;
    if !is_admin && ticket.status == TicketStatus::Archived.as_str() {
        return Err(ApiError::NotFound(Resource::Ticket));
    }
    Ok(ok(ticket))
}

async fn create_ticket(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateTicket>,
) -> Created<TicketRow> {
    Ok(created(TicketRepo::new(&state.pool).create(&input).await?))
}

async fn update_ticket(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateTicket>,
) -> ApiResult<TicketRow> {
    Ok(ok(TicketRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    TicketRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

// -- highlights -------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct HighlightQuery {
    #[serde(default)]
    all: bool,
}

/// GET /api/highlights - inactive ones only for an admin asking `all=true`
async fn list_highlights(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidQuery(query): ValidQuery<HighlightQuery>,
) -> ApiResult<Vec<HighlightRow>> {
    let include_inactive = is_admin && query.all;
    Ok(ok(HighlightRepo::new(&state.pool).list(include_inactive).await?))
}

async fn create_highlight(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateHighlight>,
) -> Created<HighlightRow> {
    Ok(created(HighlightRepo::new(&state.pool).create(&input).await?))
}

async fn update_highlight(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdateHighlight>,
) -> ApiResult<HighlightRow> {
    Ok(ok(HighlightRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_highlight(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    HighlightRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/committees", get(list_committees).post(create_committee))
        .route(
            "/committees/{id}",
            get(get_committee)
                .put(update_committee)
                .delete(delete_committee),
        )
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route("/vendors/bulk-delete", post(bulk_delete_vendors))
        .route(
            "/vendors/{id}",
            get(get_vendor).put(update_vendor).delete(delete_vendor),
        )
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route(
            "/tickets/{id}",
            get(get_ticket).put(update_ticket).delete(delete_ticket),
        )
        .route("/highlights", get(list_highlights).post(create_highlight))
        .route(
            "/highlights/{id}",
            put(update_highlight).delete(delete_highlight),
        )
}
