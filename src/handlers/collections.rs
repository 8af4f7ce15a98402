//! Collections API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::collections::{self, OverdueEntry};
use crate::error::{ApiError, ApiResult};
use crate::models::ApiResponse;
use crate::state::AppState;

/// The collections worklist: overdue loans, most overdue first
pub async fn overdue_loans(State(state): State<AppState>) -> Json<ApiResponse<Vec<OverdueEntry>>> {
    let snapshot = state.domain.snapshot().await;
    Json(ApiResponse::ok(collections::overdue_queue(
        &snapshot,
        Utc::now(),
    )))
}

/// A rendered reminder for one loan
#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub message: String,
    /// `wa.me` link with the message pre-filled; absent when the client has
    /// no usable phone number
    pub whatsapp_url: Option<String>,
}

/// Build the reminder message and WhatsApp link for a non-paid loan.
///
/// Works for loans that are overdue, due today, or due soon; the message
/// text varies with the due status.
pub async fn loan_reminder(
    State(state): State<AppState>,
    Path(loan_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<ReminderResponse>>> {
    let snapshot = state.domain.snapshot().await;
    let now = Utc::now();
    let entry = collections::entry_for_loan(&snapshot, loan_id, now)
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} has nothing to collect", loan_id)))?;
    let loan = snapshot
        .loans
        .iter()
        .find(|l| l.id == loan_id)
        .ok_or_else(|| ApiError::NotFound(format!("Loan {} not found", loan_id)))?;

    let status = collections::due_status(loan, now);
    let pix_key = pix_key_or_random(&state);
    let message = collections::reminder_message(&entry, status, &pix_key);
    let whatsapp_url = collections::whatsapp_link(&entry.phone, &message).map(|u| u.to_string());

    Ok(Json(ApiResponse::ok(ReminderResponse {
        message,
        whatsapp_url,
    })))
}

/// Tenants without a configured PIX key get a generated one per message
fn pix_key_or_random(state: &AppState) -> String {
    if state.pix_key.is_empty() {
        collections::random_pix_key()
    } else {
        state.pix_key.clone()
    }
}
