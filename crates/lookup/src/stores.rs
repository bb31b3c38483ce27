//! Collaborator capabilities for the PostgreSQL repositories.

use crate::error::BoxError;
use crate::traits::{BacktestResultsReader, DataPortal, MetadataReader, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, Kline, RemoteId};
use database::{BacktestResultsRepository, DbSession, KlineRepository, MetadataRepository};

#[async_trait]
impl MetadataReader for MetadataRepository {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError> {
        Ok(MetadataRepository::get_metadata(self, harness_id).await?)
    }
}

#[async_trait]
impl BacktestResultsReader for BacktestResultsRepository {
    async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, BoxError> {
        Ok(BacktestResultsRepository::get(self, remote_id).await?)
    }
}

#[async_trait]
impl DataPortal for KlineRepository {
    async fn klines(
        &self,
        symbol: &str,
        interval: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, BoxError> {
        Ok(self.get_klines_by_date_range(symbol, interval, start, end).await?)
    }
}

#[async_trait]
impl Session for DbSession {
    async fn health_check(&self) -> Result<(), BoxError> {
        Ok(DbSession::health_check(self).await?)
    }
}
