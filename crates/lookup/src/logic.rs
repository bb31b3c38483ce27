use crate::application::get_algo;
use crate::error::BoxError;
use crate::notebook::Collaborators;
use async_trait::async_trait;
use core_types::{AlgoMetadata, BacktestResult, HarnessId};
use std::marker::PhantomData;

/// Business logic run by the application variant, once metadata and result are resolved.
#[async_trait]
pub trait ResolvedLogic: Send + Sync {
    type Output: Send;

    async fn run(
        &self,
        metadata: AlgoMetadata,
        result: BacktestResult,
    ) -> Result<Self::Output, BoxError>;
}

/// Business logic run by the notebook variant, which receives the raw collaborators.
///
/// This is a separate contract from `ResolvedLogic`: it gets handles, not data,
/// and decides for itself what to read.
#[async_trait]
pub trait CollaboratorLogic: Send + Sync {
    type Output: Send;

    async fn run(
        &self,
        harness_id: &HarnessId,
        collaborators: &Collaborators,
    ) -> Result<Self::Output, BoxError>;
}

/// Returns the resolved metadata and result as a pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl ResolvedLogic for PassThrough {
    type Output = (AlgoMetadata, BacktestResult);

    async fn run(
        &self,
        metadata: AlgoMetadata,
        result: BacktestResult,
    ) -> Result<Self::Output, BoxError> {
        Ok((metadata, result))
    }
}

/// Resolves metadata and result through the collaborators, then passes them through.
///
/// Lets code written against the notebook variant get the same answer as the
/// application variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveAndPassThrough;

#[async_trait]
impl CollaboratorLogic for ResolveAndPassThrough {
    type Output = (AlgoMetadata, BacktestResult);

    async fn run(
        &self,
        harness_id: &HarnessId,
        collaborators: &Collaborators,
    ) -> Result<Self::Output, BoxError> {
        let pair = get_algo(
            harness_id,
            collaborators.data_portal.as_ref(),
            collaborators.metadata_store.as_ref(),
            collaborators.results_store.as_ref(),
            &PassThrough,
        )
        .await?;
        Ok(pair)
    }
}

/// Adapts a synchronous closure into `ResolvedLogic`.
pub struct FnLogic<F, T> {
    f: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnLogic<F, T>
where
    F: Fn(AlgoMetadata, BacktestResult) -> Result<T, BoxError> + Send + Sync,
    T: Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _output: PhantomData,
        }
    }
}

#[async_trait]
impl<F, T> ResolvedLogic for FnLogic<F, T>
where
    F: Fn(AlgoMetadata, BacktestResult) -> Result<T, BoxError> + Send + Sync,
    T: Send,
{
    type Output = T;

    async fn run(&self, metadata: AlgoMetadata, result: BacktestResult) -> Result<T, BoxError> {
        (self.f)(metadata, result)
    }
}
