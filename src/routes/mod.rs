//! Route definitions for the loanbook API

mod analytics;
mod clients;
mod collections;
mod document;
mod loans;
mod payments;
mod sync;

pub use analytics::analytics_routes;
pub use clients::client_routes;
pub use collections::collections_routes;
pub use document::document_routes;
pub use loans::loan_routes;
pub use payments::payment_routes;
pub use sync::sync_routes;
