use configuration::error::ConfigError;
use core_types::{CoreError, HarnessId, RemoteId};
use std::fmt;
use thiserror::Error;

/// The error type collaborators and business logic hand back.
///
/// Boxing keeps each adapter's own error intact; callers can downcast the
/// `source` of a `LookupError` to recover it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The collaborators the notebook variant can build on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorKind {
    MetadataStore,
    ResultsStore,
    Session,
    DataPortal,
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollaboratorKind::MetadataStore => "metadata store",
            CollaboratorKind::ResultsStore => "results store",
            CollaboratorKind::Session => "session",
            CollaboratorKind::DataPortal => "data portal",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to read metadata for harness '{harness_id}': {source}")]
    MetadataLookup {
        harness_id: HarnessId,
        source: BoxError,
    },

    #[error("Metadata for harness '{harness_id}' has no 'remote_id' entry")]
    MissingRemoteId { harness_id: HarnessId },

    #[error("Metadata for harness '{harness_id}' has an unusable remote id: {source}")]
    InvalidRemoteId {
        harness_id: HarnessId,
        source: CoreError,
    },

    #[error("Failed to read backtest result '{remote_id}': {source}")]
    ResultLookup { remote_id: RemoteId, source: BoxError },

    #[error("Failed to construct default {collaborator}: {source}")]
    Construction {
        collaborator: CollaboratorKind,
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Business logic failed: {0}")]
    BusinessLogic(#[source] BoxError),
}

impl LookupError {
    /// True for the key-not-found class: a missing metadata field.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, LookupError::MissingRemoteId { .. })
    }
}
