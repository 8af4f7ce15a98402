//! Supabase row backend
//!
//! The document lives in the `content` column of the single `singleton` row
//! of the `app_data` table, accessed over Supabase's PostgREST API. Writes
//! upsert with `Prefer: resolution=merge-duplicates`.

use axum::async_trait;
use serde_json::{json, Value};

use super::{RemoteStore, StoreError, StoreResult};

pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    /// Missing URL or key is a configuration error surfaced on first use,
    /// before any network I/O.
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_default(),
            api_key: api_key.unwrap_or_default(),
        }
    }

    fn check_configured(&self) -> StoreResult<()> {
        if self.base_url.is_empty() || self.api_key.is_empty() {
            return Err(StoreError::NotConfigured(
                "missing Supabase URL or key".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SupabaseStore {
    async fn read(&self) -> StoreResult<Option<String>> {
        self.check_configured()?;

        let url = format!(
            "{}/rest/v1/app_data?id=eq.singleton&select=content",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }

        let rows: Vec<Value> = response.json().await?;
        match rows.first().and_then(|row| row.get("content")) {
            Some(content) => {
                let raw = serde_json::to_string(content)
                    .map_err(|e| StoreError::BadPayload(e.to_string()))?;
                Ok(Some(raw))
            }
            None => Ok(None),
        }
    }

    async fn write(&self, content: &str) -> StoreResult<()> {
        self.check_configured()?;

        // The content column is json, so the raw string is parsed back into
        // a structured value before upserting.
        let parsed: Value = serde_json::from_str(content)
            .map_err(|e| StoreError::BadPayload(format!("content is not valid JSON: {}", e)))?;

        let url = format!("{}/rest/v1/app_data", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&json!({ "id": "singleton", "content": parsed }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
