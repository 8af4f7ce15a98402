//! In-memory backend
//!
//! Keeps the document in process memory. Used for development runs without
//! credentials and by the sync engine tests, which also need to inject
//! failures on either side of the contract.

use axum::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{RemoteStore, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw document content
    pub async fn seed(&self, content: &str) {
        *self.slot.lock().await = Some(content.to_string());
    }

    /// Current raw slot content, if any
    pub async fn content(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    /// Make subsequent reads fail (simulated outage)
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self) -> StoreResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Http {
                status: 503,
                body: "simulated read failure".to_string(),
            });
        }
        Ok(self.slot.lock().await.clone())
    }

    async fn write(&self, content: &str) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Http {
                status: 503,
                body: "simulated write failure".to_string(),
            });
        }
        *self.slot.lock().await = Some(content.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
