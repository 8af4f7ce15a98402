//! Local file cache
//!
//! One JSON file per slot: the last-known document, and the payment log.
//! The cache is a fallback for when the remote store is unreachable at
//! startup; read and write failures are logged and never fatal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use crate::models::{Document, Payment};
use crate::normalize;

/// File-backed cache for the synced document and the payment log
#[derive(Clone)]
pub struct LocalCache {
    document_path: PathBuf,
    payments_path: PathBuf,
}

impl LocalCache {
    pub fn new(document_path: PathBuf, payments_path: PathBuf) -> Self {
        Self {
            document_path,
            payments_path,
        }
    }

    /// Load the cached document, normalizing whatever shape is on disk.
    /// Returns `None` when the file is absent or unreadable.
    pub async fn load_document(&self) -> Option<Document> {
        match self.read_json(&self.document_path).await {
            Ok(Some(value)) => Some(normalize::normalize_document(&value, Utc::now())),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(path = %self.document_path.display(), error = %e, "Failed to load cached document");
                None
            }
        }
    }

    /// Persist the document. Failure is logged, not propagated.
    pub async fn save_document(&self, document: &Document) {
        if let Err(e) = self.write_json(&self.document_path, document).await {
            tracing::warn!(path = %self.document_path.display(), error = %e, "Failed to save document to local cache");
        }
    }

    /// Load the payment log; absent or unreadable file yields an empty log.
    pub async fn load_payments(&self) -> Vec<Payment> {
        match self.read_json(&self.payments_path).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.payments_path.display(), error = %e, "Failed to load payment log");
                Vec::new()
            }
        }
    }

    /// Persist the payment log. Failure is logged, not propagated.
    pub async fn save_payments(&self, payments: &[Payment]) {
        if let Err(e) = self.write_json(&self.payments_path, &payments).await {
            tracing::warn!(path = %self.payments_path.display(), error = %e, "Failed to save payment log");
        }
    }

    async fn read_json(&self, path: &PathBuf) -> Result<Option<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &PathBuf, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(value)?;
        tokio::fs::write(path, raw)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(tag: &str) -> LocalCache {
        let dir = std::env::temp_dir().join(format!("loanbook-cache-{}-{}", tag, uuid::Uuid::new_v4()));
        LocalCache::new(dir.join("data.json"), dir.join("payments.json"))
    }

    #[tokio::test]
    async fn test_document_round_trip() {
        let cache = temp_cache("doc");
        assert!(cache.load_document().await.is_none());

        let mut doc = Document::empty();
        doc.version = 3;
        cache.save_document(&doc).await;

        let loaded = cache.load_document().await.expect("document should load");
        assert_eq!(loaded.version, 3);
        assert!(loaded.loans.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_yields_none() {
        let cache = temp_cache("corrupt");
        tokio::fs::create_dir_all(std::path::Path::new(&cache.document_path).parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&cache.document_path, "{not json")
            .await
            .unwrap();
        assert!(cache.load_document().await.is_none());
    }

    #[tokio::test]
    async fn test_payments_default_empty() {
        let cache = temp_cache("payments");
        assert!(cache.load_payments().await.is_empty());
        cache.save_payments(&[]).await;
        assert!(cache.load_payments().await.is_empty());
    }
}
