//! Prom planning: events, vendor quotes, parent votes and the budget
//!
//! Reads and voting are open to parents; everything else needs an admin
//! session. Voter ids are hashed before they reach the database.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::Router;
use beeri_core::{FieldRule, Message};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{BudgetItemRow, PromEventRow, PromRepo, QuoteRow, VoteRow};
use crate::http::envelope::{created, ok, ApiResult, Created};
use crate::http::error::ApiError;
use crate::http::extractors::{AdminSession, ValidJson, ValidPath, ValidQuery};
use crate::http::server::AppState;
use crate::models::prom::{
    hash_voter, voting_open, CastVote, CreateBudgetItem, CreatePromEvent, CreateQuote,
    SetFinalist, UpdateBudgetItem, UpdatePromEvent, UpdateQuote, VoterQuery,
};
use crate::models::prom_stats::{compute_vote_stats, summarize_budget, BudgetSummary, VoteStats};
use crate::models::ValidationErrors;

// -- prom events ------------------------------------------------------------

async fn list_proms(State(state): State<Arc<AppState>>) -> ApiResult<Vec<PromEventRow>> {
    Ok(ok(PromRepo::new(&state.pool).list().await?))
}

async fn get_prom(
    State(state): State<Arc<AppState>>,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<PromEventRow> {
    Ok(ok(PromRepo::new(&state.pool).get(id).await?))
}

async fn create_prom(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidJson(input): ValidJson<CreatePromEvent>,
) -> Created<PromEventRow> {
    Ok(created(PromRepo::new(&state.pool).create(&input).await?))
}

async fn update_prom(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<UpdatePromEvent>,
) -> ApiResult<PromEventRow> {
    Ok(ok(PromRepo::new(&state.pool).update(id, &input).await?))
}

async fn delete_prom(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(id): ValidPath<Uuid>,
) -> ApiResult<()> {
    PromRepo::new(&state.pool).delete(id).await?;
    Ok(ok(()))
}

// -- quotes -----------------------------------------------------------------

async fn list_quotes(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
) -> ApiResult<Vec<QuoteRow>> {
    Ok(ok(PromRepo::new(&state.pool).list_quotes(prom_id).await?))
}

async fn create_quote(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(prom_id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<CreateQuote>,
) -> Created<QuoteRow> {
    Ok(created(
        PromRepo::new(&state.pool).create_quote(prom_id, &input).await?,
    ))
}

async fn update_quote(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath((prom_id, quote_id)): ValidPath<(Uuid, Uuid)>,
    ValidJson(input): ValidJson<UpdateQuote>,
) -> ApiResult<QuoteRow> {
    let quote = PromRepo::new(&state.pool)
        .update_quote(prom_id, quote_id, &input)
        .await?;
    Ok(ok(quote))
}

async fn set_finalist(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath((prom_id, quote_id)): ValidPath<(Uuid, Uuid)>,
    ValidJson(input): ValidJson<SetFinalist>,
) -> ApiResult<QuoteRow> {
    let quote = PromRepo::new(&state.pool)
        .set_finalist(prom_id, quote_id, input.is_finalist)
        .await?;
    Ok(ok(quote))
}

async fn delete_quote(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath((prom_id, quote_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    PromRepo::new(&state.pool)
        .delete_quote(prom_id, quote_id)
        .await?;
    Ok(ok(()))
}

// -- votes ------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct VoteReceipt {
    #[serde(flatten)]
    pub vote: VoteRow,
    /// `true` when an earlier vote by the same parent was replaced
    pub updated: bool,
}

/// POST /api/prom/{id}/votes - one vote per parent per quote; voting
/// again replaces the earlier rating.
#[instrument(skip_all)]
async fn cast_vote(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<CastVote>,
) -> Created<VoteReceipt> {
    let repo = PromRepo::new(&state.pool);
    let prom = repo.get(prom_id).await?;
    if !voting_open(prom.voting_enabled, prom.voting_ends_at, Utc::now()) {
        return Err(ApiError::BadRequest(Message::VotingClosed));
    }

    let quote = repo.get_quote(prom_id, input.quote_id).await?;
    if !quote.is_finalist {
        return Err(ApiError::BadRequest(Message::QuoteNotFinalist));
    }

    let voter_hash = hash_voter(&state.voter_salt, prom_id, &input.voter_id);
    let (vote, inserted) = repo
        .upsert_vote(
            prom_id,
            quote.id,
            &voter_hash,
            input.rating,
            input.comment.as_deref(),
        )
        .await?;

    let status = if inserted {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let (_, body) = created(VoteReceipt {
        vote,
        updated: !inserted,
    });
    Ok((status, body))
}

/// GET /api/prom/{id}/votes/mine?voter_id=
async fn my_votes(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
    ValidQuery(query): ValidQuery<VoterQuery>,
) -> ApiResult<Vec<VoteRow>> {
    if query.voter_id.trim().is_empty() {
        return Err(ValidationErrors::single("voter_id", FieldRule::Required).into());
    }
    let voter_hash = hash_voter(&state.voter_salt, prom_id, &query.voter_id);
    let votes = PromRepo::new(&state.pool)
        .votes_by_voter(prom_id, &voter_hash)
        .await?;
    Ok(ok(votes))
}

/// GET /api/prom/{id}/votes/stats
async fn vote_stats(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
) -> ApiResult<VoteStats> {
    let repo = PromRepo::new(&state.pool);
    repo.get(prom_id).await?;
    let (quotes, votes) = repo.vote_inputs(prom_id).await?;
    Ok(ok(compute_vote_stats(&quotes, &votes)))
}

// -- budget -----------------------------------------------------------------

async fn list_budget(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
) -> ApiResult<Vec<BudgetItemRow>> {
    Ok(ok(PromRepo::new(&state.pool).list_budget(prom_id).await?))
}

async fn create_budget_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath(prom_id): ValidPath<Uuid>,
    ValidJson(input): ValidJson<CreateBudgetItem>,
) -> Created<BudgetItemRow> {
    Ok(created(
        PromRepo::new(&state.pool)
            .create_budget_item(prom_id, &input)
            .await?,
    ))
}

async fn update_budget_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath((prom_id, item_id)): ValidPath<(Uuid, Uuid)>,
    ValidJson(input): ValidJson<UpdateBudgetItem>,
) -> ApiResult<BudgetItemRow> {
    let item = PromRepo::new(&state.pool)
        .update_budget_item(prom_id, item_id, &input)
        .await?;
    Ok(ok(item))
}

async fn delete_budget_item(
    State(state): State<Arc<AppState>>,
    _admin: AdminSession,
    ValidPath((prom_id, item_id)): ValidPath<(Uuid, Uuid)>,
) -> ApiResult<()> {
    PromRepo::new(&state.pool)
        .delete_budget_item(prom_id, item_id)
        .await?;
    Ok(ok(()))
}

/// GET /api/prom/{id}/budget/summary
async fn budget_summary(
    State(state): State<Arc<AppState>>,
    ValidPath(prom_id): ValidPath<Uuid>,
) -> ApiResult<BudgetSummary> {
    let repo = PromRepo::new(&state.pool);
    let prom = repo.get(prom_id).await?;
    let lines = repo.budget_lines(prom_id).await?;
    Ok(ok(summarize_budget(
        prom.budget_total,
        prom.student_count,
        &lines,
    )))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prom", get(list_proms).post(create_prom))
        .route(
            "/prom/{id}",
            get(get_prom).put(update_prom).delete(delete_prom),
        )
        .route("/prom/{id}/quotes", get(list_quotes).post(create_quote))
        .route(
            "/prom/{id}/quotes/{quote_id}",
            put(update_quote).delete(delete_quote),
        )
        .route(
            "/prom/{id}/quotes/{quote_id}/finalist",
            patch(set_finalist),
        )
        .route("/prom/{id}/votes", post(cast_vote))
        .route("/prom/{id}/votes/mine", get(my_votes))
        .route("/prom/{id}/votes/stats", get(vote_stats))
        .route("/prom/{id}/budget", get(list_budget).post(create_budget_item))
        .route("/prom/{id}/budget/summary", get(budget_summary))
        .route(
            "/prom/{id}/budget/{item_id}",
            put(update_budget_item).delete(delete_budget_item),
        )
}

#[cfg(test)]
mod tests {
    use crate::http::test_support::{get, post_json, request_json};
    use axum::http::StatusCode;

    const PROM: &str = "0b6c3d0e-5f7e-4d8a-9c1b-2e3f4a5b6c7d";
    const QUOTE: &str = "5e0c6a7b-1d2e-4f3a-8b9c-0d1e2f3a4b5c";

    #[tokio::test]
    async fn rating_out_of_range_is_rejected() {
        let (status, body) = post_json(
            &format!("/api/prom/{PROM}/votes"),
            &format!(r#"{{"quote_id":"{QUOTE}","voter_id":"parent-1","rating":6}}"#),
            false,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"][0].as_str().unwrap().starts_with("rating:"));
    }

    #[tokio::test]
    async fn finalist_toggle_requires_admin() {
        let (status, _) = request_json(
            "PATCH",
            &format!("/api/prom/{PROM}/quotes/{QUOTE}/finalist"),
            r#"{"is_finalist":true}"#,
            false,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn my_votes_needs_voter_id() {
        let (status, _) = get(&format!("/api/prom/{PROM}/votes/mine")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(&format!("/api/prom/{PROM}/votes/mine?voter_id=%20")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn malformed_quote_id_is_400() {
        let (status, _) = request_json(
            "DELETE",
            &format!("/api/prom/{PROM}/quotes/nope"),
            "",
            true,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
