//! Remote document store backends
//!
//! The store holds exactly one logical document per tenant, replaced
//! wholesale on every write. Two interchangeable backends implement the same
//! contract: a public GitHub gist and a Supabase single-row table. Which one
//! runs is a configuration decision, not a functional difference.

mod gist;
mod memory;
mod supabase;

pub use gist::GistStore;
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

use axum::async_trait;
use thiserror::Error;

/// Store-level errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Missing credentials/identifiers; raised before any network I/O
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    /// Non-2xx from the backing store, passed through as-is
    #[error("Store returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Store request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed store payload: {0}")]
    BadPayload(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write contract over the single remote document slot
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the raw JSON content of the document; `None` when the slot
    /// does not exist yet.
    async fn read(&self) -> StoreResult<Option<String>>;

    /// Replace the document wholesale (upsert: creates the slot if absent)
    async fn write(&self, content: &str) -> StoreResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
