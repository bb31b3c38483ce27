//! In-memory collaborators for unit tests.

use crate::error::{BoxError, CollaboratorKind};
use crate::factory::CollaboratorFactory;
use crate::traits::{BacktestResultsReader, DataPortal, MetadataReader, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use configuration::{SessionConfig, StoreConfig};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, Kline, RemoteId};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
#[error("no entry for key '{0}'")]
pub struct StoreMiss(pub String);

#[derive(Default)]
pub struct InMemoryMetadata {
    documents: HashMap<HarnessId, Value>,
    calls: Mutex<Vec<HarnessId>>,
}

impl InMemoryMetadata {
    pub fn with(mut self, harness_id: &str, document: Value) -> Self {
        self.documents.insert(HarnessId::new(harness_id), document);
        self
    }

    pub fn calls(&self) -> Vec<HarnessId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataReader for InMemoryMetadata {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError> {
        self.calls.lock().unwrap().push(harness_id.clone());
        let document = self
            .documents
            .get(harness_id)
            .cloned()
            .ok_or_else(|| StoreMiss(harness_id.to_string()))?;
        Ok(AlgoMetadata::try_from(document)?)
    }
}

pub struct FailingMetadata;

#[async_trait]
impl MetadataReader for FailingMetadata {
    async fn get_metadata(&self, harness_id: &HarnessId) -> Result<AlgoMetadata, BoxError> {
        Err(Box::new(StoreMiss(harness_id.to_string())))
    }
}

#[derive(Default)]
pub struct InMemoryResults {
    results: HashMap<RemoteId, Value>,
    calls: Mutex<Vec<RemoteId>>,
}

impl InMemoryResults {
    pub fn with(mut self, remote_id: &str, result: Value) -> Self {
        self.results.insert(RemoteId::new(remote_id), result);
        self
    }

    pub fn calls(&self) -> Vec<RemoteId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BacktestResultsReader for InMemoryResults {
    async fn get(&self, remote_id: &RemoteId) -> Result<BacktestResult, BoxError> {
        self.calls.lock().unwrap().push(remote_id.clone());
        let result = self
            .results
            .get(remote_id)
            .cloned()
            .ok_or_else(|| StoreMiss(remote_id.to_string()))?;
        Ok(BacktestResult::new(result))
    }
}

pub struct NullDataPortal;

#[async_trait]
impl DataPortal for NullDataPortal {
    async fn klines(
        &self,
        _symbol: &str,
        _interval: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Kline>, BoxError> {
        Ok(Vec::new())
    }
}

pub struct NullSession;

#[async_trait]
impl Session for NullSession {
    async fn health_check(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Records every construction request. Built collaborators are empty fakes.
#[derive(Default)]
pub struct SpyFactory {
    /// Each call with the URL of the config section it was given, if any.
    calls: Mutex<Vec<(CollaboratorKind, Option<String>)>>,
    fail_on: Option<CollaboratorKind>,
}

impl SpyFactory {
    pub fn failing_on(kind: CollaboratorKind) -> Self {
        Self {
            calls: Mutex::default(),
            fail_on: Some(kind),
        }
    }

    pub fn calls(&self) -> Vec<(CollaboratorKind, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, kind: CollaboratorKind, url: Option<&str>) -> Result<(), BoxError> {
        self.calls.lock().unwrap().push((kind, url.map(str::to_string)));
        if self.fail_on == Some(kind) {
            return Err(format!("cannot build {}", kind).into());
        }
        Ok(())
    }
}

#[async_trait]
impl CollaboratorFactory for SpyFactory {
    async fn metadata_store(&self, config: &StoreConfig) -> Result<Arc<dyn MetadataReader>, BoxError> {
        self.record(CollaboratorKind::MetadataStore, Some(config.url.as_str()))?;
        Ok(Arc::new(InMemoryMetadata::default()))
    }

    async fn results_store(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn BacktestResultsReader>, BoxError> {
        self.record(CollaboratorKind::ResultsStore, Some(config.url.as_str()))?;
        Ok(Arc::new(InMemoryResults::default()))
    }

    async fn session(&self, config: &SessionConfig) -> Result<Arc<dyn Session>, BoxError> {
        self.record(CollaboratorKind::Session, Some(config.url.as_str()))?;
        Ok(Arc::new(NullSession))
    }

    async fn data_portal(&self) -> Result<Arc<dyn DataPortal>, BoxError> {
        self.record(CollaboratorKind::DataPortal, None)?;
        Ok(Arc::new(NullDataPortal))
    }
}
