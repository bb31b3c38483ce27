use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use configuration::{Config, LogFormat, StoreConfig};
use core_types::{AlgoMetadata, BacktestResult, HarnessId, RemoteId, REMOTE_ID_KEY};
use database::{BacktestResultsRepository, MetadataRepository};
use lookup::{
    get_algo, AlgoLookup, BoxError, CollaboratorLogic, CollaboratorOverrides, Collaborators,
    DbCollaboratorFactory, PassThrough,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the harness lookup tool.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if present.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    let mut logging = config.logging.clone();
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = configuration::init_tracing(&logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Get(args) => handle_get(args, &config).await,
        Commands::Inspect(args) => handle_inspect(args, &config).await,
        Commands::Seed(args) => handle_seed(args, &config).await,
        Commands::Migrate => handle_migrate(&config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Looks up algorithm metadata and backtest results by harness id.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the `[logging] format` setting.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a harness with every store built from configuration.
    Get(GetArgs),
    /// Resolve a harness, overriding individual stores and defaulting the rest.
    Inspect(InspectArgs),
    /// Write a metadata document and its backtest result.
    Seed(SeedArgs),
    /// Apply database migrations to the metadata and results stores.
    Migrate,
}

#[derive(Parser)]
struct GetArgs {
    /// The harness to resolve (e.g., "H1").
    #[arg(long)]
    harness_id: HarnessId,
}

#[derive(Parser)]
struct InspectArgs {
    #[arg(long)]
    harness_id: HarnessId,

    /// Use this metadata store instead of `[metadata_store] url`.
    #[arg(long)]
    metadata_url: Option<String>,

    /// Use this results store instead of `[results_store] url`.
    #[arg(long)]
    results_url: Option<String>,
}

#[derive(Parser)]
struct SeedArgs {
    #[arg(long)]
    harness_id: HarnessId,

    #[arg(long)]
    remote_id: RemoteId,

    /// The metadata document as a JSON object. `remote_id` is filled in.
    #[arg(long, default_value = "{}")]
    metadata: String,

    /// The backtest result as any JSON value.
    #[arg(long)]
    result: String,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_get(args: GetArgs, config: &Config) -> anyhow::Result<()> {
    let lookup = AlgoLookup::connect(config, &DbCollaboratorFactory).await?;
    let (metadata, result) = lookup.get_algo(&args.harness_id, &PassThrough).await?;

    println!("{}", metadata_table(&metadata));
    println!("{}", result_table(&result));
    Ok(())
}

/// What `inspect` reports back: session health plus the resolved pair.
struct Inspection {
    session_healthy: bool,
    metadata: AlgoMetadata,
    result: BacktestResult,
}

struct Inspect;

#[async_trait]
impl CollaboratorLogic for Inspect {
    type Output = Inspection;

    async fn run(
        &self,
        harness_id: &HarnessId,
        collaborators: &Collaborators,
    ) -> Result<Inspection, BoxError> {
        let session_healthy = match collaborators.session.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Session health check failed.");
                false
            }
        };

        let (metadata, result) = get_algo(
            harness_id,
            collaborators.data_portal.as_ref(),
            collaborators.metadata_store.as_ref(),
            collaborators.results_store.as_ref(),
            &PassThrough,
        )
        .await?;

        Ok(Inspection {
            session_healthy,
            metadata,
            result,
        })
    }
}

async fn handle_inspect(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    let mut overrides = CollaboratorOverrides::new();
    if let Some(url) = args.metadata_url {
        let pool = database::connect_with(&with_url(&config.metadata_store, url)).await?;
        overrides = overrides.with_metadata_store(Arc::new(MetadataRepository::new(pool)));
    }
    if let Some(url) = args.results_url {
        let pool = database::connect_with(&with_url(&config.results_store, url)).await?;
        overrides = overrides.with_results_store(Arc::new(BacktestResultsRepository::new(pool)));
    }

    let inspection = lookup::get_algo_with_defaults(
        &args.harness_id,
        overrides,
        config,
        &DbCollaboratorFactory,
        &Inspect,
    )
    .await?;

    println!(
        "Session: {}",
        if inspection.session_healthy { "healthy" } else { "unreachable" }
    );
    println!("{}", metadata_table(&inspection.metadata));
    println!("{}", result_table(&inspection.result));
    Ok(())
}

async fn handle_seed(args: SeedArgs, config: &Config) -> anyhow::Result<()> {
    let document: Value =
        serde_json::from_str(&args.metadata).context("--metadata is not valid JSON")?;
    let mut metadata = AlgoMetadata::try_from(document)?;
    metadata.insert(REMOTE_ID_KEY, Value::String(args.remote_id.to_string()));

    let result = BacktestResult::new(
        serde_json::from_str(&args.result).context("--result is not valid JSON")?,
    );

    let metadata_repo = MetadataRepository::new(database::connect_with(&config.metadata_store).await?);
    let results_repo =
        BacktestResultsRepository::new(database::connect_with(&config.results_store).await?);

    metadata_repo.save_metadata(&args.harness_id, &metadata).await?;
    results_repo.save_result(&args.remote_id, &result).await?;

    tracing::info!(harness_id = %args.harness_id, remote_id = %args.remote_id, "Seeded harness.");
    Ok(())
}

async fn handle_migrate(config: &Config) -> anyhow::Result<()> {
    for (name, store) in [
        ("metadata store", &config.metadata_store),
        ("results store", &config.results_store),
    ] {
        let pool = database::connect_with(store).await?;
        database::run_migrations(&pool)
            .await
            .with_context(|| format!("Failed to migrate the {}", name))?;
        tracing::info!("Migrated the {}.", name);
    }
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn with_url(base: &StoreConfig, url: String) -> StoreConfig {
    StoreConfig {
        url,
        ..base.clone()
    }
}

fn metadata_table(metadata: &AlgoMetadata) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metadata", "Value"]);
    for (key, value) in metadata.iter() {
        table.add_row(vec![key.clone(), render_value(value)]);
    }
    table
}

fn result_table(result: &BacktestResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Result", "Value"]);
    match result.as_value() {
        Value::Object(fields) => {
            for (key, value) in fields {
                table.add_row(vec![key.clone(), render_value(value)]);
            }
        }
        other => {
            table.add_row(vec!["(value)".to_string(), render_value(other)]);
        }
    }
    table
}

/// Strings print bare; everything else prints as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
