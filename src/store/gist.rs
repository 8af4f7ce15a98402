//! GitHub gist backend
//!
//! The document lives in the first file of a public gist. Reads need no
//! credentials; writes PATCH the gist and require a personal access token
//! with the gist scope.

use axum::async_trait;
use serde_json::{json, Value};

use super::{RemoteStore, StoreError, StoreResult};

const GITHUB_API: &str = "https://api.github.com";

pub struct GistStore {
    client: reqwest::Client,
    api_base: String,
    gist_id: String,
    token: Option<String>,
}

impl GistStore {
    pub fn new(gist_id: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GITHUB_API.to_string(),
            gist_id,
            token,
        }
    }

    /// Override the API base URL (tests)
    #[allow(dead_code)]
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base;
        self
    }

    async fn fetch_gist(&self) -> StoreResult<Option<Value>> {
        let url = format!("{}/gists/{}", self.api_base, self.gist_id);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "loanbook-server")
            .send()
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http { status, body });
        }

        Ok(Some(response.json().await?))
    }

    /// First file name in the gist; the document always lives there
    fn first_file<'a>(gist: &'a Value) -> StoreResult<(&'a str, &'a Value)> {
        gist.get("files")
            .and_then(|f| f.as_object())
            .and_then(|files| files.iter().next())
            .map(|(name, file)| (name.as_str(), file))
            .ok_or_else(|| StoreError::BadPayload("gist has no files".to_string()))
    }
}

#[async_trait]
impl RemoteStore for GistStore {
    async fn read(&self) -> StoreResult<Option<String>> {
        let Some(gist) = self.fetch_gist().await? else {
            return Ok(None);
        };
        let (_, file) = Self::first_file(&gist)?;
        let content = file
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| StoreError::BadPayload("gist file has no content".to_string()))?;
        Ok(Some(content.to_string()))
    }

    async fn write(&self, content: &str) -> StoreResult<()> {
        let token = self.token.as_ref().ok_or_else(|| {
            StoreError::NotConfigured("missing gist write token".to_string())
        })?;

        // The file name is discovered from gist metadata before patching
        let gist = self.fetch_gist().await?.ok_or_else(|| StoreError::Http {
            status: 404,
            body: "gist not found".to_string(),
        })?;
        let (file_name, _) = Self::first_file(&gist)?;

        let url = format!("{}/gists/{}", self.api_base, self.gist_id);
        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "loanbook-server")
            .json(&json!({ "files": { file_name: { "content": content } } }))
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
        "gist"
    }
}
