//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::domain::DomainService;
use crate::sync::SyncEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub domain: Arc<DomainService>,
    pub sync: Arc<SyncEngine>,
    /// PIX key quoted in collection reminders
    pub pix_key: String,
}

impl AppState {
    pub fn new(domain: Arc<DomainService>, sync: Arc<SyncEngine>, pix_key: String) -> Self {
        Self {
            domain,
            sync,
            pix_key,
        }
    }
}

impl FromRef<AppState> for Arc<DomainService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.domain.clone()
    }
}

impl FromRef<AppState> for Arc<SyncEngine> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sync.clone()
    }
}
