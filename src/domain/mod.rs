//! Domain service: typed CRUD over clients, loans, and payments

mod service;

pub use service::{DomainService, PaymentStats};
