//! Sync engine
//!
//! Owns the authoritative in-process copy of the document, mirrors every
//! local mutation to the remote store, and periodically refreshes from the
//! remote even without local mutations.
//!
//! The consistency model is overwrite-wins by construction: every pull
//! replaces the in-memory document wholesale, every push replaces the remote
//! wholesale, and there is no field-level merge and no version check before
//! writing. The last completed pull or push determines the observed state.
//! An unreachable remote degrades to the in-memory/local-cache state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::cache::LocalCache;
use crate::models::Document;
use crate::normalize;
use crate::store::RemoteStore;

/// Engine lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Uninitialized,
    Loading,
    Ready,
    Reconciling,
}

pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    cache: LocalCache,
    state: RwLock<Document>,
    phase: RwLock<SyncPhase>,
    tx: broadcast::Sender<Document>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RemoteStore>, cache: LocalCache) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            store,
            cache,
            state: RwLock::new(Document::empty()),
            phase: RwLock::new(SyncPhase::Uninitialized),
            tx,
        }
    }

    /// Initial load: local cache as fallback, then the remote as authority.
    /// A remote without a document gets the empty initial document written
    /// before first use.
    pub async fn init(&self) {
        *self.phase.write().await = SyncPhase::Loading;

        if let Some(cached) = self.cache.load_document().await {
            tracing::info!(version = cached.version, "Loaded document from local cache");
            *self.state.write().await = cached;
        }

        match self.store.read().await {
            Ok(Some(raw)) => {
                self.replace_from_raw(&raw).await;
            }
            Ok(None) => {
                let initial = self.state.read().await.clone();
                tracing::info!(
                    backend = self.store.name(),
                    "Remote store empty, writing initial document"
                );
                self.push(&initial).await;
            }
            Err(e) => {
                tracing::warn!(
                    backend = self.store.name(),
                    error = %e,
                    "Initial pull failed, continuing with local state"
                );
            }
        }

        *self.phase.write().await = SyncPhase::Ready;
    }

    /// Pull the remote document and replace in-memory state unconditionally
    /// on success. Failure is logged and leaves the current state untouched.
    /// Returns whether the pull succeeded.
    pub async fn refresh(&self) -> bool {
        match self.store.read().await {
            Ok(Some(raw)) => {
                self.replace_from_raw(&raw).await;
                true
            }
            Ok(None) => {
                tracing::debug!(backend = self.store.name(), "Remote has no document yet");
                false
            }
            Err(e) => {
                tracing::warn!(backend = self.store.name(), error = %e, "Pull failed");
                false
            }
        }
    }

    /// Apply a local mutation under the full pull/mutate/push/pull protocol:
    ///
    /// 1. best-effort pull (latest remote state wins over in-memory)
    /// 2. apply the mutation; bump `version`, stamp `lastUpdated`
    /// 3. publish the new snapshot to subscribers
    /// 4. persist to the local cache
    /// 5. push wholesale to the remote (failure logged, no rollback)
    /// 6. best-effort pull to reconcile
    ///
    /// Returns the snapshot produced by step 2.
    pub async fn mutate<F>(&self, apply: F) -> Document
    where
        F: FnOnce(&mut Document),
    {
        *self.phase.write().await = SyncPhase::Reconciling;

        self.refresh().await;

        let snapshot = {
            let mut state = self.state.write().await;
            apply(&mut state);
            state.last_updated = Utc::now();
            state.version += 1;
            state.clone()
        };
        self.publish(&snapshot);

        self.cache.save_document(&snapshot).await;
        self.push(&snapshot).await;
        self.refresh().await;

        *self.phase.write().await = SyncPhase::Ready;
        snapshot
    }

    /// Current in-memory document
    pub async fn snapshot(&self) -> Document {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> SyncPhase {
        *self.phase.read().await
    }

    /// Name of the backing store, for status reporting
    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Subscribe to the document feed: the current snapshot plus a receiver
    /// for every subsequent one.
    pub async fn subscribe(&self) -> (Document, broadcast::Receiver<Document>) {
        // Receiver first so a concurrent publish cannot fall in the gap
        let rx = self.tx.subscribe();
        let snapshot = self.state.read().await.clone();
        (snapshot, rx)
    }

    /// Periodic background refresh; runs for the life of the process.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        tracing::info!(
            backend = self.store.name(),
            interval_secs = interval.as_secs(),
            "Background sync started"
        );
        loop {
            tokio::time::sleep(interval).await;
            self.refresh().await;
        }
    }

    async fn replace_from_raw(&self, raw: &str) {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Remote document is not valid JSON, keeping current state");
                return;
            }
        };
        let document = normalize::normalize_document(&value, Utc::now());
        {
            let mut state = self.state.write().await;
            if *state == document {
                return;
            }
            tracing::debug!(version = document.version, "Replacing state from remote");
            *state = document.clone();
        }
        self.cache.save_document(&document).await;
        self.publish(&document);
    }

    async fn push(&self, document: &Document) {
        let raw = match serde_json::to_string_pretty(document) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize document for push");
                return;
            }
        };
        if let Err(e) = self.store.write(&raw).await {
            tracing::warn!(
                backend = self.store.name(),
                error = %e,
                "Push failed, local state remains authoritative until next pull"
            );
        }
    }

    fn publish(&self, document: &Document) {
        // No subscribers is fine
        let _ = self.tx.send(document.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn temp_cache() -> LocalCache {
        let dir = std::env::temp_dir().join(format!("loanbook-sync-{}", uuid::Uuid::new_v4()));
        LocalCache::new(dir.join("data.json"), dir.join("payments.json"))
    }

    fn engine() -> (Arc<MemoryStore>, SyncEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = SyncEngine::new(store.clone(), temp_cache());
        (store, engine)
    }

    #[tokio::test]
    async fn test_init_writes_initial_document_to_empty_remote() {
        let (store, engine) = engine();
        assert_eq!(engine.phase().await, SyncPhase::Uninitialized);

        engine.init().await;
        assert_eq!(engine.phase().await, SyncPhase::Ready);

        let raw = store.content().await.expect("initial document pushed");
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert!(value["emprestimos"].as_array().unwrap().is_empty());
        assert!(value["clientes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_prefers_remote_over_cache() {
        let (store, engine) = engine();
        store
            .seed(r#"{"emprestimos": [], "clientes": [], "version": 9}"#)
            .await;

        engine.init().await;
        assert_eq!(engine.snapshot().await.version, 9);
    }

    #[tokio::test]
    async fn test_mutation_bumps_version_and_pushes() {
        let (store, engine) = engine();
        engine.init().await;

        let doc = engine
            .mutate(|doc| {
                doc.clients.push(crate::normalize::normalize_client(
                    &serde_json::json!({"id": 1, "nome": "Maria"}),
                    Utc::now(),
                ));
            })
            .await;

        assert_eq!(doc.version, 2);
        assert_eq!(doc.clients.len(), 1);

        let raw = store.content().await.unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 2);
        assert_eq!(value["clientes"][0]["nome"], "Maria");
    }

    #[tokio::test]
    async fn test_mutation_survives_remote_outage() {
        let (store, engine) = engine();
        engine.init().await;
        store.set_fail_reads(true);
        store.set_fail_writes(true);

        let doc = engine.mutate(|doc| doc.loans.clear()).await;
        assert_eq!(doc.version, 2);
        // Local state is authoritative while the remote is down
        assert_eq!(engine.snapshot().await.version, 2);
        assert_eq!(engine.phase().await, SyncPhase::Ready);
    }

    #[tokio::test]
    async fn test_refresh_overwrites_in_memory_state() {
        let (store, engine) = engine();
        engine.init().await;
        engine.mutate(|_| {}).await;

        // Remote replaced out-of-band; the next pull wins wholesale
        store
            .seed(r#"{"emprestimos": [], "clientes": [], "version": 42}"#)
            .await;
        assert!(engine.refresh().await);
        assert_eq!(engine.snapshot().await.version, 42);
    }

    #[tokio::test]
    async fn test_last_publish_wins_no_merge() {
        let (store, engine) = engine();
        engine.init().await;

        // A mutation lands version 2 with one client
        engine
            .mutate(|doc| {
                doc.clients.push(crate::normalize::normalize_client(
                    &serde_json::json!({"id": 1, "nome": "Maria"}),
                    Utc::now(),
                ));
            })
            .await;

        // A background pull completes afterwards with a disjoint document:
        // it fully replaces the mutated state, no merge
        store
            .seed(r#"{"emprestimos": [], "clientes": [{"id": 2, "nome": "João"}], "version": 7}"#)
            .await;
        engine.refresh().await;

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.version, 7);
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.clients[0].name, "João");
    }

    #[tokio::test]
    async fn test_subscribe_gets_snapshot_then_updates() {
        let (_store, engine) = engine();
        engine.init().await;

        let (snapshot, mut rx) = engine.subscribe().await;
        assert_eq!(snapshot.version, 1);

        engine.mutate(|_| {}).await;
        let next = rx.recv().await.unwrap();
        assert_eq!(next.version, 2);
    }

    #[tokio::test]
    async fn test_malformed_remote_keeps_state() {
        let (store, engine) = engine();
        engine.init().await;
        store.seed("{definitely not json").await;

        engine.refresh().await;
        assert_eq!(engine.snapshot().await.version, 1);
    }
}
