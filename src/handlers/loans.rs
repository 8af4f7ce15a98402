//! Loan API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, CreateLoanRequest, Loan, UpdateStatusRequest};
use crate::normalize;
use crate::state::AppState;

/// List all loans
pub async fn list_loans(State(state): State<AppState>) -> Json<ApiResponse<Vec<Loan>>> {
    Json(ApiResponse::ok(state.domain.list_loans().await))
}

/// Get a single loan by id
pub async fn get_loan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = state
        .domain
        .get_loan(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", id)))?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// Create a loan with derived fields filled in
pub async fn create_loan(
    State(state): State<AppState>,
    Json(request): Json<CreateLoanRequest>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    let loan = state.domain.add_loan(request).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// Replace a loan record, accepting loosely-typed JSON
pub async fn update_loan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<Json<ApiResponse<Loan>>> {
    if !body.is_object() {
        return Err(ApiError::BadRequest("expected a JSON object".to_string()));
    }

    let mut loan = normalize::normalize_loan(&body, Utc::now());
    loan.id = id;

    let updated = state.domain.update_loan(loan).await;
    Ok(Json(ApiResponse::ok(updated)))
}

/// Remove a loan and its payment log entries
pub async fn delete_loan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    state.domain.remove_loan(id).await;
    Json(ApiResponse::ok(()))
}

/// Set the loan status
pub async fn update_loan_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Json<ApiResponse<()>> {
    state.domain.update_loan_status(id, request.status).await;
    Json(ApiResponse::ok(()))
}

/// Renewal response
#[derive(Debug, Serialize)]
pub struct RenewalResponse {
    #[serde(rename = "proximoVencimento")]
    pub next_due_date: DateTime<Utc>,
}

/// Renew a loan cycle: push the due date one cycle forward
pub async fn renew_loan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ApiResponse<RenewalResponse>>> {
    let next_due_date = state
        .domain
        .renew_loan(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found or already paid", id)))?;
    Ok(Json(ApiResponse::ok(RenewalResponse { next_due_date })))
}
