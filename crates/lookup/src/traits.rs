use crate::error::BoxError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, Kline, RemoteId};
use std::sync::Arc;

/// Maps a harness id to its metadata document.
#[async_trait]
pub trait MetadataReader: Send + Sync {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError>;
}

/// Maps a remote id to a stored backtest result.
#[async_trait]
pub trait BacktestResultsReader: Send + Sync {
    async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, BoxError>;
}

/// Market data access handed through to business logic.
///
/// The lookup itself never reads from it.
#[async_trait]
pub trait DataPortal: Send + Sync {
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, BoxError>;
}

/// A live session against an external store, handed through to business logic.
#[async_trait]
pub trait Session: Send + Sync {
    async fn health_check(&self) -> Result<(), BoxError>;
}

#[async_trait]
impl<T: MetadataReader + ?Sized> MetadataReader for Arc<T> {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError> {
        (**self).get_metadata(harness_id).await
    }
}

#[async_trait]
impl<T: BacktestResultsReader + ?Sized> BacktestResultsReader for Arc<T> {
    async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, BoxError> {
        (**self).get(remote_id).await
    }
}
