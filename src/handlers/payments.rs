//! Payment API handlers

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::collections;
use crate::domain::PaymentStats;
use crate::error::ApiResult;
use crate::models::{ApiResponse, Payment, PaymentKind, RecordPaymentRequest};
use crate::state::AppState;

/// List recorded payments, newest first
pub async fn list_payments(State(state): State<AppState>) -> Json<ApiResponse<Vec<Payment>>> {
    Json(ApiResponse::ok(state.domain.list_payments().await))
}

/// A recorded payment plus the confirmation message to forward to the client
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    #[serde(flatten)]
    pub payment: Payment,
    #[serde(rename = "mensagemConfirmacao")]
    pub confirmation: String,
}

/// Record a payment against a loan.
///
/// A settlement closes the loan; an interest payment renews the cycle. The
/// response carries a ready-to-send confirmation message for the client.
pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> ApiResult<Json<ApiResponse<PaymentReceipt>>> {
    let payment = state.domain.record_payment(request).await?;

    let snapshot = state.domain.snapshot().await;
    let client_name = snapshot
        .clients
        .iter()
        .find(|c| c.id == payment.client_id)
        .map(|c| c.name.as_str())
        .unwrap_or("cliente");
    let pix_key = if state.pix_key.is_empty() {
        collections::random_pix_key()
    } else {
        state.pix_key.clone()
    };
    let confirmation = match (payment.kind, payment.next_due_date) {
        (PaymentKind::Interest, Some(next_due)) => {
            collections::renewal_confirmation(client_name, payment.amount, next_due, &pix_key)
        }
        _ => collections::settlement_confirmation(client_name, payment.amount, &pix_key),
    };

    Ok(Json(ApiResponse::ok(PaymentReceipt {
        payment,
        confirmation,
    })))
}

/// Aggregate payment statistics for today and the current month
pub async fn payment_stats(State(state): State<AppState>) -> Json<ApiResponse<PaymentStats>> {
    Json(ApiResponse::ok(state.domain.payment_stats(Utc::now()).await))
}
