//! API handlers

mod analytics;
mod clients;
mod collections;
mod document;
mod loans;
mod payments;
mod sync;

pub use analytics::*;
pub use clients::*;
pub use collections::*;
pub use document::*;
pub use loans::*;
pub use payments::*;
pub use sync::*;

use axum::Json;
use serde_json::json;

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
