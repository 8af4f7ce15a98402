//! Loan route definitions

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route(
            "/api/loans/:id",
            get(get_loan).put(update_loan).delete(delete_loan),
        )
        .route("/api/loans/:id/status", patch(update_loan_status))
        .route("/api/loans/:id/renew", post(renew_loan))
}
