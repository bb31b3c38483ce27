use crate::application::AlgoLookup;
use crate::error::{BoxError, CollaboratorKind, LookupError};
use crate::factory::{construct, CollaboratorFactory};
use crate::logic::CollaboratorLogic;
use crate::traits::{BacktestResultsReader, DataPortal, MetadataReader, Session};
use async_trait::async_trait;
use configuration::{
    Config, ConfigFile, SessionConfig, StoreConfig, METADATA_STORE_SECTION, RESULTS_STORE_SECTION,
    SESSION_SECTION,
};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, RemoteId};
use std::path::Path;
use std::sync::Arc;

/// Collaborators the caller already has. Anything left as `None` is built
/// from configuration when the lookup runs.
#[derive(Clone, Default)]
pub struct CollaboratorOverrides {
    pub metadata_store: Option<Arc<dyn MetadataReader>>,
    pub results_store: Option<Arc<dyn BacktestResultsReader>>,
    pub session: Option<Arc<dyn Session>>,
    pub data_portal: Option<Arc<dyn DataPortal>>,
}

/// A complete set of collaborators, either supplied or built by a factory.
///
/// Built collaborators live as long as this value; dropping it releases their
/// pools.
#[derive(Clone)]
pub struct Collaborators {
    pub metadata_store: Arc<dyn MetadataReader>,
    pub results_store: Arc<dyn BacktestResultsReader>,
    pub session: Arc<dyn Session>,
    pub data_portal: Arc<dyn DataPortal>,
}

impl CollaboratorOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata_store(mut self, store: Arc<dyn MetadataReader>) -> Self {
        self.metadata_store = Some(store);
        self
    }

    pub fn with_results_store(mut self, store: Arc<dyn BacktestResultsReader>) -> Self {
        self.results_store = Some(store);
        self
    }

    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_data_portal(mut self, data_portal: Arc<dyn DataPortal>) -> Self {
        self.data_portal = Some(data_portal);
        self
    }

    /// Returns the collaborators if every one was supplied, otherwise gives
    /// the overrides back untouched.
    pub fn into_collaborators(self) -> Result<Collaborators, Self> {
        match self {
            CollaboratorOverrides {
                metadata_store: Some(metadata_store),
                results_store: Some(results_store),
                session: Some(session),
                data_portal: Some(data_portal),
            } => Ok(Collaborators {
                metadata_store,
                results_store,
                session,
                data_portal,
            }),
            partial => Err(partial),
        }
    }
}

impl Collaborators {
    /// Moves onto the application-facing lookup, dropping the session.
    pub fn into_lookup(self) -> AlgoLookup {
        AlgoLookup::new(self.data_portal, self.metadata_store, self.results_store)
    }
}

#[async_trait]
impl MetadataReader for Collaborators {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError> {
        self.metadata_store.get_metadata(harness_id).await
    }
}

#[async_trait]
impl BacktestResultsReader for Collaborators {
    async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, BoxError> {
        self.results_store.get(remote_id).await
    }
}

/// Fills in every missing collaborator using `factory` and the matching
/// section of `config`.
///
/// Construction runs in a fixed order (metadata store, results store, session,
/// data portal) and stops at the first failure.
pub async fn resolve(
    overrides: CollaboratorOverrides,
    config: &Config,
    factory: &dyn CollaboratorFactory,
) -> Result<Collaborators, LookupError> {
    resolve_with(
        overrides,
        factory,
        || Ok(config.metadata_store.clone()),
        || Ok(config.results_store.clone()),
        || Ok(config.session.clone()),
    )
    .await
}

/// Each section getter is called only if its collaborator has to be built.
/// The data portal never needs one.
async fn resolve_with<M, R, S>(
    overrides: CollaboratorOverrides,
    factory: &dyn CollaboratorFactory,
    metadata_section: M,
    results_section: R,
    session_section: S,
) -> Result<Collaborators, LookupError>
where
    M: FnOnce() -> Result<StoreConfig, LookupError>,
    R: FnOnce() -> Result<StoreConfig, LookupError>,
    S: FnOnce() -> Result<SessionConfig, LookupError>,
{
    let CollaboratorOverrides {
        metadata_store,
        results_store,
        session,
        data_portal,
    } = overrides;

    let metadata_store = match metadata_store {
        Some(store) => store,
        None => {
            let section = metadata_section()?;
            construct(CollaboratorKind::MetadataStore, factory.metadata_store(&section)).await?
        }
    };

    let results_store = match results_store {
        Some(store) => store,
        None => {
            let section = results_section()?;
            construct(CollaboratorKind::ResultsStore, factory.results_store(&section)).await?
        }
    };

    let session = match session {
        Some(session) => session,
        None => {
            let section = session_section()?;
            construct(CollaboratorKind::Session, factory.session(&section)).await?
        }
    };

    let data_portal = match data_portal {
        Some(portal) => portal,
        None => construct(CollaboratorKind::DataPortal, factory.data_portal()).await?,
    };

    Ok(Collaborators {
        metadata_store,
        results_store,
        session,
        data_portal,
    })
}

/// Runs `logic` against a complete collaborator set, building whatever the
/// caller left out.
#[tracing::instrument(name = "get_algo_with_defaults", skip_all, fields(harness_id = %harness_id))]
pub async fn get_algo_with_defaults<L>(
    harness_id: &HarnessId,
    overrides: CollaboratorOverrides,
    config: &Config,
    factory: &dyn CollaboratorFactory,
    logic: &L,
) -> Result<L::Output, LookupError>
where
    L: CollaboratorLogic + ?Sized,
{
    let collaborators = resolve(overrides, config, factory).await?;
    run(harness_id, &collaborators, logic).await
}

/// Like `get_algo_with_defaults`, but reads the configuration file only for
/// the sections of collaborators that actually have to be built.
///
/// Only the omitted collaborators' sections are read, and they are not
/// validated. Omitting just the data portal never touches the file.
#[tracing::instrument(name = "get_algo_with_config_file", skip_all, fields(harness_id = %harness_id))]
pub async fn get_algo_with_config_file<L>(
    harness_id: &HarnessId,
    overrides: CollaboratorOverrides,
    config_path: &Path,
    factory: &dyn CollaboratorFactory,
    logic: &L,
) -> Result<L::Output, LookupError>
where
    L: CollaboratorLogic + ?Sized,
{
    let file = ConfigFile::new(config_path);
    let collaborators = resolve_with(
        overrides,
        factory,
        || Ok(file.section::<StoreConfig>(METADATA_STORE_SECTION)?),
        || Ok(file.section::<StoreConfig>(RESULTS_STORE_SECTION)?),
        || Ok(file.section::<SessionConfig>(SESSION_SECTION)?),
    )
    .await?;
    run(harness_id, &collaborators, logic).await
}

async fn run<L>(
    harness_id: &HarnessId,
    collaborators: &Collaborators,
    logic: &L,
) -> Result<L::Output, LookupError>
where
    L: CollaboratorLogic + ?Sized,
{
    logic
        .run(harness_id, collaborators)
        .await
        .map_err(LookupError::BusinessLogic)
}
