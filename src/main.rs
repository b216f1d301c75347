//! `harvest` - one-shot repository harvest.
//!
//! Reads the TOML configuration, harvests every configured collection, and
//! uploads `<blob_name>.zip` to the configured object store.
//!
//! ```bash
//! AZURE_STORAGE_SAS_TOKEN=... harvest --config ./harvest.toml
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use repository_harvester::{
    load_config, AzureBlobStore, Config, DotProgress, DspaceClient, HarvestPipeline, LocalStore,
    ObjectStore, StorageBackend,
};

/// Harvest repository metadata and open-access full text into an uploaded
/// zip archive.
#[derive(Parser)]
#[command(name = "harvest", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "harvest.toml")]
    config: PathBuf,
}

async fn run<S: ObjectStore>(config: &Config, store: S) -> Result<()> {
    let client = DspaceClient::new(&config.repository.base_url, &config.repository.document_host);
    let pipeline = HarvestPipeline::new(client, store)
        .with_concurrency(config.harvest.concurrency)
        .with_progress(DotProgress::new());

    let report = pipeline.execute(config).await?;
    println!(
        "Uploaded {} ({} items, {} plaintext files, {} bytes)",
        report.archive_name,
        report.stats.items,
        report.stats.plaintext_files,
        report.stats.archive_size_bytes
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match &config.storage.backend {
        StorageBackend::AzureBlob {
            account_url,
            sas_token_env,
        } => {
            let store = AzureBlobStore::from_env(account_url.as_str(), sas_token_env)?;
            run(&config, store).await
        }
        StorageBackend::Local { root } => run(&config, LocalStore::new(root.clone())).await,
    }
}
