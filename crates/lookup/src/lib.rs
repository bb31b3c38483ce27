//! # Harness Lookup Core
//!
//! Resolves a harness id to its algorithm metadata and backtest result and
//! hands them to business logic.
//!
//! ## Architectural Principles
//!
//! - **Capabilities, not concrete stores:** `MetadataReader`,
//!   `BacktestResultsReader`, `DataPortal` and `Session` are async traits.
//!   The core only ever sees them as `dyn` handles, so tests swap in fakes and
//!   production plugs in the `database` repositories (see `stores`).
//! - **Explicit configuration:** Nothing reads global state. Defaults are
//!   built by a `CollaboratorFactory` from a `Config` the caller passes in.
//! - **Errors propagate:** No stage retries or swallows a failure. Each is
//!   tagged with the stage it came from, with the original error kept as
//!   `source`.
//!
//! ## Public API
//!
//! - `get_algo` / `AlgoLookup`: the application form. Takes ready
//!   collaborators, looks up metadata, follows `remote_id` to the result, and
//!   runs `ResolvedLogic`.
//! - `get_algo_with_defaults` / `get_algo_with_config_file`: the notebook form.
//!   Missing collaborators are built on demand, then `CollaboratorLogic`
//!   receives the harness id and the full `Collaborators` set.
//! - `LookupError`: The specific error types that can be returned from this crate.

pub mod application;
pub mod error;
pub mod factory;
pub mod logic;
pub mod notebook;
pub mod stores;
pub mod traits;

#[cfg(test)]
mod fakes;

pub use application::{get_algo, AlgoLookup};
pub use error::{BoxError, CollaboratorKind, LookupError};
pub use factory::{CollaboratorFactory, DbCollaboratorFactory};
pub use logic::{CollaboratorLogic, FnLogic, PassThrough, ResolveAndPassThrough, ResolvedLogic};
pub use notebook::{
    get_algo_with_config_file, get_algo_with_defaults, resolve, CollaboratorOverrides,
    Collaborators,
};
pub use traits::{BacktestResultsReader, DataPortal, MetadataReader, Session};
