//! Collections route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn collections_routes() -> Router<AppState> {
    Router::new()
        .route("/api/collections/overdue", get(overdue_loans))
        .route("/api/collections/:loan_id/reminder", get(loan_reminder))
}
