//! Raw document route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn document_routes() -> Router<AppState> {
    Router::new().route("/api/document", get(get_document).post(save_document))
}
