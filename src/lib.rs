//! Loanbook backend library
//!
//! Core modules for the loan-management backend: the sync engine and its
//! pluggable remote stores, the data normalizer, financial rules, and the
//! domain service the HTTP surface is built on.

pub mod analytics;
pub mod cache;
pub mod collections;
pub mod config;
pub mod domain;
pub mod error;
pub mod finance;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;
pub mod ws;
