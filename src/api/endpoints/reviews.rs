//! Review endpoints: verdicts, corrections, history and the summary board.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::{Contract, ReviewRecord};
use crate::review::{self, ReviewSubmission, ReviewSummary};

#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    pub field_name: String,
    pub is_correct: Option<bool>,
    pub human_value: Option<String>,
    pub reviewer: String,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct SubmitReviewResponse {
    pub record: ReviewRecord,
    pub promoted: bool,
}

/// `POST /api/contracts/:id/reviews` — record one field verdict or
/// correction. `promoted` reports whether this review cleared the
/// contract's review flag.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let outcome = review::record_review(
        &conn,
        id,
        ReviewSubmission {
            field_name: payload.field_name,
            is_correct: payload.is_correct,
            human_value: payload.human_value,
            reviewer: payload.reviewer,
            notes: payload.notes,
        },
    )?;
    Ok(Json(SubmitReviewResponse {
        record: outcome.record,
        promoted: outcome.promoted,
    }))
}

/// `GET /api/contracts/:id/reviews` — full review history, oldest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReviewRecord>>, ApiError> {
    let conn = ctx.open_db()?;
    repository::get_contract(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Contract not found: {id}")))?;
    Ok(Json(repository::list_reviews(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct PendingParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// `GET /api/reviews/pending` — contracts still flagged for review.
pub async fn pending(
    State(ctx): State<ApiContext>,
    Query(params): Query<PendingParams>,
) -> Result<Json<Vec<Contract>>, ApiError> {
    use super::contracts::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let conn = ctx.open_db()?;
    Ok(Json(repository::list_contracts_requiring_review(
        &conn,
        page_size,
        (page - 1) * page_size,
    )?))
}

/// `GET /api/reviews/summary`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<ReviewSummary>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(review::review_summary(&conn)?))
}
