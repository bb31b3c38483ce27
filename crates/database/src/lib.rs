//! # Harness Lookup Database Crate
//!
//! This crate is the PostgreSQL adapter for every external store the lookup
//! talks to: algorithm metadata, backtest results, historical klines (the data
//! portal) and the session handle.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the workspace sees typed
//!   repositories returning `core-types` values.
//! - **Runtime-checked queries:** Queries use `sqlx::query`/`query_scalar`
//!   with bound parameters, so building the workspace does not need a live
//!   database.
//! - **Asynchronous & Pooled:** Every repository wraps a `PgPool`; cloning a
//!   repository is cheap and shares the pool.
//!
//! ## Public API
//!
//! - `connect`, `connect_with`, `connect_session`: pool construction from the
//!   environment, a store section, or the session section.
//! - `run_migrations`: applies the bundled schema.
//! - `MetadataRepository`, `BacktestResultsRepository`, `KlineRepository`, `DbSession`.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_session, connect_with, run_migrations};
pub use error::DbError;
pub use repository::{BacktestResultsRepository, DbSession, KlineRepository, MetadataRepository};
