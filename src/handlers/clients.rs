//! Client API handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, Client, CreateClientRequest};
use crate::normalize;
use crate::state::AppState;

/// List all clients
pub async fn list_clients(State(state): State<AppState>) -> Json<ApiResponse<Vec<Client>>> {
    Json(ApiResponse::ok(state.domain.list_clients().await))
}

/// Register a new client
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    let client = state.domain.add_client(request).await?;
    Ok(Json(ApiResponse::ok(client)))
}

/// Replace a client record.
///
/// The body is taken as raw JSON and run through the normalizer so
/// locale-formatted numbers and loose date strings are accepted.
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<Json<ApiResponse<Client>>> {
    if !body.is_object() {
        return Err(ApiError::BadRequest("expected a JSON object".to_string()));
    }

    let mut client = normalize::normalize_client(&body, Utc::now());
    client.id = id;

    let updated = state.domain.update_client(client).await;
    Ok(Json(ApiResponse::ok(updated)))
}

/// Remove a client. Loans referencing it are left in place.
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<ApiResponse<()>> {
    state.domain.remove_client(id).await;
    Json(ApiResponse::ok(()))
}
