//! Sync engine API handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::ApiResponse;
use crate::state::AppState;
use crate::sync::SyncPhase;

/// Sync engine status
#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub backend: &'static str,
    pub phase: SyncPhase,
    pub version: u64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// Report the engine phase and document version
pub async fn sync_status(State(state): State<AppState>) -> Json<ApiResponse<SyncStatus>> {
    let snapshot = state.sync.snapshot().await;
    Json(ApiResponse::ok(SyncStatus {
        backend: state.sync.backend(),
        phase: state.sync.phase().await,
        version: snapshot.version,
        last_updated: snapshot.last_updated,
    }))
}

/// Refresh result
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    pub version: u64,
}

/// Force an immediate pull from the remote store.
///
/// `refreshed` is false when the remote was unreachable or empty; local
/// state stays authoritative in that case.
pub async fn force_refresh(State(state): State<AppState>) -> Json<ApiResponse<RefreshResponse>> {
    let refreshed = state.sync.refresh().await;
    let version = state.sync.snapshot().await.version;
    Json(ApiResponse::ok(RefreshResponse { refreshed, version }))
}
