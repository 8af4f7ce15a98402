//! Sync route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sync/status", get(sync_status))
        .route("/api/sync/refresh", post(force_refresh))
}
