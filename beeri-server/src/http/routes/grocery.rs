//! Shared grocery lists
//!
//! Admins create lists; parents open them through the share token and
//! claim items, optionally only part of an item's quantity.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use beeri_core::token::{generate_share_token, looks_like_share_token};
use beeri_core::{FieldRule, Message, Resource};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{
    ClaimOutcome, GroceryItemRow, GroceryListRow, GroceryListSummary, GroceryRepo,
};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminSession, MaybeAdmin, ValidJson, ValidPath};
use crate::http::server::AppState;
use crate::models::grocery::{
    AddGroceryItems, ChangeGroceryStatus, ClaimItem, ClaimRejection, CreateGroceryList,
    UpdateGroceryItem,
};
use crate::models::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct GroceryListView {
    pub list: GroceryListRow,
    pub items: Vec<GroceryItemRow>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResult {
    pub claimed: GroceryItemRow,
    /// Open row left after a partial claim
    pub remainder: Option<GroceryItemRow>,
}

/// Resolve a share token, 404 for anything that cannot be one.
async fn list_for(state: &AppState, token: &str) -> Result<GroceryListRow, ApiError> {
    if !looks_like_share_token(token) {
        return Err(ApiError::NotFound(Resource::GroceryList));
    }
    Ok(GroceryRepo::new(&state.pool).get_by_token(token).await?)
}

/// Link holders may change items only while the list is active.
async fn editable_list(
    state: &AppState,
    token: &str,
    is_admin: bool,
) -> Result<GroceryListRow, ApiError> {
    let list = list_for(state, token).await?;
    if !is_admin && !list.is_active() {
        return Err(ApiError::BadRequest(Message::ListNotActive));
    }
    Ok(list)
}

/// GET /api/grocery
async fn list_all(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
) -> ApiResult<Vec<GroceryListSummary>> {
    Ok(ok(GroceryRepo::new(&state.pool).list_all().await?))
}

/// POST /api/grocery
async fn create_list(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreateGroceryList>,
) -> Created<GroceryListRow> {
    let list = GroceryRepo::new(&state.pool)
        .create(&input, &generate_share_token())
        .await?;
    Ok(created(list))
}

/// GET /api/grocery/{token}
async fn get_list(
    State(state): State<Arc<AppState>>,
    ValidPath(token): ValidPath<String>,
) -> ApiResult<GroceryListView> {
    let list = list_for(&state, &token).await?;
    let items = GroceryRepo::new(&state.pool).items(list.id).await?;
    Ok(ok(GroceryListView { list, items }))
}

/// PATCH /api/grocery/{token}
async fn change_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(token): ValidPath<String>,
    ValidJson(input): ValidJson<ChangeGroceryStatus>,
) -> ApiResult<GroceryListRow> {
    if !looks_like_share_token(&token) {
        return Err(ApiError::NotFound(Resource::GroceryList));
    }
    let list = GroceryRepo::new(&state.pool)
        .set_status(&token, input.status)
        .await?;
    tracing::info!(list_id = %list.id, status = %list.status, "grocery list status changed");
    Ok(ok(list))
}

/// POST /api/grocery/{token}/items
async fn add_items(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath(token): ValidPath<String>,
    ValidJson(input): ValidJson<AddGroceryItems>,
) -> Created<Vec<GroceryItemRow>> {
    let list = editable_list(&state, &token, is_admin).await?;
    let items = GroceryRepo::new(&state.pool)
        .add_items(list.id, &input.items)
        .await?;
    Ok(created(items))
}

/// PUT /api/grocery/{token}/items/{item_id}
async fn update_item(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath((token, item_id)): ValidPath<(String, Uuid)>,
    ValidJson(input): ValidJson<UpdateGroceryItem>,
) -> ApiResult<GroceryItemRow> {
    let list = editable_list(&state, &token, is_admin).await?;
    let item = GroceryRepo::new(&state.pool)
        .update_item(list.id, item_id, &input)
        .await?;
    Ok(ok(item))
}

/// DELETE /api/grocery/{token}/items/{item_id}
async fn delete_item(
    State(state): State<Arc<AppState>>,
    MaybeAdmin(is_admin): MaybeAdmin,
    ValidPath((token, item_id)): ValidPath<(String, Uuid)>,
) -> ApiResult<()> {
    let list = editable_list(&state, &token, is_admin).await?;
    GroceryRepo::new(&state.pool)
        .delete_item(list.id, item_id)
        .await?;
    Ok(ok(()))
}

/// POST /api/grocery/{token}/items/{item_id}/claim
///
/// Omitting `quantity` (or asking for all of it) claims the whole row.
/// Asking for less splits the row: the original keeps the rest and a new
/// claimed row holds the requested amount.
#[instrument(skip_all)]
async fn claim_item(
    State(state): State<Arc<AppState>>,
    ValidPath((token, item_id)): ValidPath<(String, Uuid)>,
    ValidJson(input): ValidJson<ClaimItem>,
) -> ApiResult<ClaimResult> {
    let list = editable_list(&state, &token, false).await?;
    let outcome = GroceryRepo::new(&state.pool)
        .claim_item(list.id, item_id, &input.claimer_name, input.quantity)
        .await?;

    match outcome {
        ClaimOutcome::Claimed { claimed, remainder } => {
            tracing::info!(
                list_id = %list.id,
                claimed_quantity = claimed.quantity,
                split = remainder.is_some(),
                "grocery item claimed"
            );
            Ok(ok(ClaimResult { claimed, remainder }))
        }
        ClaimOutcome::Rejected(ClaimRejection::AlreadyClaimed) => {
            Err(ApiError::Conflict(Message::ItemAlreadyClaimed))
        }
        ClaimOutcome::Rejected(ClaimRejection::ExceedsAvailable) => {
            Err(ApiError::BadRequest(Message::ClaimExceedsAvailable))
        }
        ClaimOutcome::Rejected(ClaimRejection::InvalidQuantity) => {
            Err(ValidationErrors::single("quantity", FieldRule::InvalidFormat).into())
        }
    }
}

/// DELETE /api/grocery/{token}/items/{item_id}/claim
async fn unclaim_item(
    State(state): State<Arc<AppState>>,
    ValidPath((token, item_id)): ValidPath<(String, Uuid)>,
) -> ApiResult<GroceryItemRow> {
    let list = editable_list(&state, &token, false).await?;
    match GroceryRepo::new(&state.pool)
        .unclaim_item(list.id, item_id)
        .await?
    {
        Some(item) => Ok(ok(item)),
        None => Err(ApiError::Conflict(Message::ItemNotClaimed)),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/grocery", get(list_all).post(create_list))
        .route("/grocery/{token}", get(get_list).patch(change_status))
        .route("/grocery/{token}/items", post(add_items))
        .route(
            "/grocery/{token}/items/{item_id}",
            put(update_item).delete(delete_item),
        )
        .route(
            "/grocery/{token}/items/{item_id}/claim",
            post(claim_item).delete(unclaim_item),
        )
}
