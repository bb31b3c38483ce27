use crate::error::{BoxError, CollaboratorKind, LookupError};
use crate::traits::{BacktestResultsReader, DataPortal, MetadataReader, Session};
use async_trait::async_trait;
use configuration::{SessionConfig, StoreConfig};
use database::{BacktestResultsRepository, DbSession, KlineRepository, MetadataRepository};
use std::future::Future;
use std::sync::Arc;

/// Builds the default collaborators the notebook variant falls back to.
///
/// Each method receives its own configuration section; the data portal is
/// built without one.
#[async_trait]
pub trait CollaboratorFactory: Send + Sync {
    async fn metadata_store(&self, config: &StoreConfig) -> Result<Arc<dyn MetadataReader>, BoxError>;

    async fn results_store(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn BacktestResultsReader>, BoxError>;

    async fn session(&self, config: &SessionConfig) -> Result<Arc<dyn Session>, BoxError>;

    async fn data_portal(&self) -> Result<Arc<dyn DataPortal>, BoxError>;
}

/// Opens PostgreSQL pools and wraps them in the database repositories.
///
/// The data portal connects through `DATABASE_URL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbCollaboratorFactory;

#[async_trait]
impl CollaboratorFactory for DbCollaboratorFactory {
    async fn metadata_store(&self, config: &StoreConfig) -> Result<Arc<dyn MetadataReader>, BoxError> {
        let pool = database::connect_with(config).await?;
        Ok(Arc::new(MetadataRepository::new(pool)))
    }

    async fn results_store(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn BacktestResultsReader>, BoxError> {
        let pool = database::connect_with(config).await?;
        Ok(Arc::new(BacktestResultsRepository::new(pool)))
    }

    async fn session(&self, config: &SessionConfig) -> Result<Arc<dyn Session>, BoxError> {
        let pool = database::connect_session(config).await?;
        Ok(Arc::new(DbSession::new(pool)))
    }

    async fn data_portal(&self) -> Result<Arc<dyn DataPortal>, BoxError> {
        let pool = database::connect().await?;
        Ok(Arc::new(KlineRepository::new(pool)))
    }
}

/// Awaits one construction step, tagging a failure with the collaborator it was for.
pub(crate) async fn construct<T>(
    kind: CollaboratorKind,
    build: impl Future<Output = Result<T, BoxError>>,
) -> Result<T, LookupError> {
    tracing::info!(collaborator = %kind, "Constructing default collaborator.");
    build.await.map_err(|source| LookupError::Construction {
        collaborator: kind,
        source,
    })
}
