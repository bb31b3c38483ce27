use crate::error::{CollaboratorKind, LookupError};
use crate::factory::{construct, CollaboratorFactory};
use crate::logic::ResolvedLogic;
use crate::traits::{BacktestResultsReader, DataPortal, MetadataReader};
use core_types::{CoreError, HarnessId};
use configuration::Config;
use std::sync::Arc;

/// Resolves a harness to its metadata and backtest result and runs `logic` on them.
///
/// The metadata reader is called once with `harness_id`, then the results
/// reader once with the metadata's `remote_id`. Whatever `logic` returns is
/// handed back unchanged. Nothing is retried; the first failure is returned,
/// and a missing `remote_id` fails before the results reader is touched.
///
/// `data_portal` is part of the collaborator set but this path does not read it.
#[tracing::instrument(name = "get_algo", skip_all, fields(harness_id = %harness_id))]
pub async fn get_algo<L>(
    harness_id: &HarnessId,
    _data_portal: &dyn DataPortal,
    metadata_reader: &dyn MetadataReader,
    results_reader: &dyn BacktestResultsReader,
    logic: &L,
) -> Result<L::Output, LookupError>
where
    L: ResolvedLogic + ?Sized,
{
    let metadata = metadata_reader
        .get_metadata(harness_id)
        .await
        .map_err(|source| LookupError::MetadataLookup {
            harness_id: harness_id.clone(),
            source,
        })?;
    tracing::debug!(entries = metadata.len(), "Metadata resolved.");

    let remote_id = metadata.remote_id().map_err(|e| match e {
        CoreError::MissingField(_) => LookupError::MissingRemoteId {
            harness_id: harness_id.clone(),
        },
        other => LookupError::InvalidRemoteId {
            harness_id: harness_id.clone(),
            source: other,
        },
    })?;

    let result = results_reader
        .get(&remote_id)
        .await
        .map_err(|source| LookupError::ResultLookup {
            remote_id: remote_id.clone(),
            source,
        })?;
    tracing::debug!(remote_id = %remote_id, "Backtest result resolved.");

    logic
        .run(metadata, result)
        .await
        .map_err(LookupError::BusinessLogic)
}

/// The application-facing lookup: a fixed set of collaborators, reused per call.
#[derive(Clone)]
pub struct AlgoLookup {
    data_portal: Arc<dyn DataPortal>,
    metadata_reader: Arc<dyn MetadataReader>,
    results_reader: Arc<dyn BacktestResultsReader>,
}

impl AlgoLookup {
    pub fn new(
        data_portal: Arc<dyn DataPortal>,
        metadata_reader: Arc<dyn MetadataReader>,
        results_reader: Arc<dyn BacktestResultsReader>,
    ) -> Self {
        Self {
            data_portal,
            metadata_reader,
            results_reader,
        }
    }

    pub async fn get_algo<L>(&self, harness_id: &HarnessId, logic: &L) -> Result<L::Output, LookupError>
    where
        L: ResolvedLogic + ?Sized,
    {
        get_algo(
            harness_id,
            self.data_portal.as_ref(),
            self.metadata_reader.as_ref(),
            self.results_reader.as_ref(),
            logic,
        )
        .await
    }

    /// Builds every collaborator through `factory`.
    pub async fn connect(config: &Config, factory: &dyn CollaboratorFactory) -> Result<Self, LookupError> {
        let metadata_reader = construct(
            CollaboratorKind::MetadataStore,
            factory.metadata_store(&config.metadata_store),
        )
        .await?;
        let results_reader = construct(
            CollaboratorKind::ResultsStore,
            factory.results_store(&config.results_store),
        )
        .await?;
        let data_portal = construct(CollaboratorKind::DataPortal, factory.data_portal()).await?;
        Ok(Self::new(data_portal, metadata_reader, results_reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{
        FailingMetadata, InMemoryMetadata, InMemoryResults, NullDataPortal, SpyFactory, StoreMiss,
    };
    use crate::logic::{FnLogic, PassThrough};
    use crate::error::BoxError;
    use core_types::{AlgoMetadata, BacktestResult, RemoteId};
    use serde_json::json;

    fn h1_fixture() -> (InMemoryMetadata, InMemoryResults) {
        let metadata = InMemoryMetadata::default().with("H1", json!({"remote_id": "R1"}));
        let results = InMemoryResults::default().with("R1", json!({"pnl": 42}));
        (metadata, results)
    }

    #[tokio::test]
    async fn returns_metadata_and_result_pair() {
        let (metadata, results) = h1_fixture();

        let (meta, result) = get_algo(
            &HarnessId::new("H1"),
            &NullDataPortal,
            &metadata,
            &results,
            &PassThrough,
        )
        .await
        .unwrap();

        assert_eq!(serde_json::to_value(&meta).unwrap(), json!({"remote_id": "R1"}));
        assert_eq!(result.into_inner(), json!({"pnl": 42}));
    }

    #[tokio::test]
    async fn calls_each_reader_exactly_once_with_the_right_key() {
        let (metadata, results) = h1_fixture();

        get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &PassThrough)
            .await
            .unwrap();

        assert_eq!(metadata.calls(), vec![HarnessId::new("H1")]);
        assert_eq!(results.calls(), vec![RemoteId::new("R1")]);
    }

    #[tokio::test]
    async fn business_logic_output_is_returned_unchanged() {
        let (metadata, results) = h1_fixture();
        let logic = FnLogic::new(|meta: AlgoMetadata, result: BacktestResult| {
            Ok(format!(
                "{}:{}",
                meta.remote_id()?,
                result.get("pnl").cloned().unwrap_or_default()
            ))
        });

        let output = get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &logic)
            .await
            .unwrap();

        assert_eq!(output, "R1:42");
    }

    #[tokio::test]
    async fn missing_remote_id_fails_before_results_lookup() {
        let metadata = InMemoryMetadata::default().with("H1", json!({}));
        let results = InMemoryResults::default().with("R1", json!({"pnl": 42}));

        let err = get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &PassThrough)
            .await
            .unwrap_err();

        assert!(err.is_missing_key());
        assert!(results.calls().is_empty());
    }

    #[tokio::test]
    async fn non_scalar_remote_id_is_reported_separately() {
        let metadata = InMemoryMetadata::default().with("H1", json!({"remote_id": ["R1"]}));
        let results = InMemoryResults::default();

        let err = get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &PassThrough)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::InvalidRemoteId { .. }));
        assert!(results.calls().is_empty());
    }

    #[tokio::test]
    async fn metadata_failure_keeps_the_reader_error_as_source() {
        let results = InMemoryResults::default();

        let err = get_algo(&HarnessId::new("H9"), &NullDataPortal, &FailingMetadata, &results, &PassThrough)
            .await
            .unwrap_err();

        match err {
            LookupError::MetadataLookup { harness_id, source } => {
                assert_eq!(harness_id, HarnessId::new("H9"));
                assert!(source.downcast_ref::<StoreMiss>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(results.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_remote_id_is_a_result_lookup_failure() {
        let metadata = InMemoryMetadata::default().with("H1", json!({"remote_id": "R404"}));
        let results = InMemoryResults::default();

        let err = get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &PassThrough)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::ResultLookup { ref remote_id, .. } if remote_id.as_str() == "R404"));
    }

    #[tokio::test]
    async fn business_logic_failure_propagates() {
        let (metadata, results) = h1_fixture();
        let logic = FnLogic::new(|_: AlgoMetadata, _: BacktestResult| -> Result<(), BoxError> {
            Err("strategy rejected result".into())
        });

        let err = get_algo(&HarnessId::new("H1"), &NullDataPortal, &metadata, &results, &logic)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::BusinessLogic(ref e) if e.to_string() == "strategy rejected result"));
    }

    #[tokio::test]
    async fn algo_lookup_reuses_its_collaborators() {
        let (metadata, results) = h1_fixture();
        let metadata = Arc::new(metadata);
        let results = Arc::new(results);
        let lookup = AlgoLookup::new(Arc::new(NullDataPortal), metadata.clone(), results.clone());

        for _ in 0..3 {
            lookup.get_algo(&HarnessId::new("H1"), &PassThrough).await.unwrap();
        }

        assert_eq!(metadata.calls().len(), 3);
        assert_eq!(results.calls().len(), 3);
    }

    #[tokio::test]
    async fn connect_builds_only_the_application_collaborators() {
        let config = configuration::load_config_from_str(
            r#"
            [metadata_store]
            url = "postgres://meta"
            [results_store]
            url = "postgres://results"
            [session]
            url = "postgres://session"
            "#,
        )
        .unwrap();
        let factory = SpyFactory::default();

        if let Err(e) = AlgoLookup::connect(&config, &factory).await {
            panic!("connect failed: {e}");
        }

        let kinds: Vec<_> = factory.calls().into_iter().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                CollaboratorKind::MetadataStore,
                CollaboratorKind::ResultsStore,
                CollaboratorKind::DataPortal,
            ]
        );
    }
}
