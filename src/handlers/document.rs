//! Raw document endpoints
//!
//! Mirrors the thin proxy contract older clients use: the whole document
//! travels as an opaque `content` string.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::ApiResponse;
use crate::normalize;
use crate::state::AppState;

/// Wire shape of the proxy contract
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub content: Option<String>,
}

/// The current document serialized as a `content` string
pub async fn get_document(State(state): State<AppState>) -> ApiResult<Json<DocumentEnvelope>> {
    let snapshot = state.sync.snapshot().await;
    let content = serde_json::to_string_pretty(&snapshot)?;
    Ok(Json(DocumentEnvelope {
        content: Some(content),
    }))
}

/// Replace the whole document from a `content` string.
///
/// The content is parsed and normalized before it replaces the current
/// state; the replacement is then pushed like any other mutation.
pub async fn save_document(
    State(state): State<AppState>,
    Json(envelope): Json<DocumentEnvelope>,
) -> ApiResult<Json<ApiResponse<u64>>> {
    let content = envelope
        .content
        .ok_or_else(|| ApiError::BadRequest("Missing content".to_string()))?;

    let parsed: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON content: {}", e)))?;
    let incoming = normalize::normalize_document(&parsed, Utc::now());

    let snapshot = state.sync.mutate(|doc| *doc = incoming).await;
    Ok(Json(ApiResponse::ok(snapshot.version)))
}
