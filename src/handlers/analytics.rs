//! Analytics API handlers

use axum::{extract::State, Json};
use chrono::Utc;

use crate::analytics::{self, DashboardSummary};
use crate::models::ApiResponse;
use crate::state::AppState;

/// Dashboard summary over the current document snapshot
pub async fn dashboard(State(state): State<AppState>) -> Json<ApiResponse<DashboardSummary>> {
    let snapshot = state.domain.snapshot().await;
    Json(ApiResponse::ok(analytics::dashboard_summary(
        &snapshot,
        Utc::now(),
    )))
}
