//! Harvest run orchestrator.
//!
//! This module provides the [`HarvestPipeline`] coordinator that executes one
//! harvest run (Collections → Metadata JSON → Archive → Upload) with:
//! - Async execution via `tokio`
//! - Bounded per-item execution via [`HarvestExecutor`]
//! - Structured logging via `tracing`
//! - Guaranteed cleanup of local state via RAII (`Drop` on [`WorkingDir`])

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::executor::HarvestExecutor;
use crate::harvest::{archive, collection};
use crate::model::{AggregateMetadata, METADATA_FILE};
use crate::progress::{ProgressReporter, SilentProgress};
use crate::traits::{ClientError, ObjectStore, RepositoryClient, StorageError};

// ============================================================================
// Working Directory
// ============================================================================

/// Local working state of one run: the working directory and the sibling
/// `<name>.zip` archive.
///
/// # RAII Cleanup
///
/// `WorkingDir` implements [`Drop`] to remove both paths on every exit path,
/// including error returns and panics. Drop never fails; problems are logged
/// so the error that ended the run stays the one reported.
/// It intentionally does **not** implement `Clone`.
///
/// # Security
///
/// Use [`WorkingDir::safe_child`] to resolve file names inside the directory.
/// It rejects any path that would escape the root via `..` or absolute
/// components (item identifiers come from the remote API).
#[derive(Debug)]
pub struct WorkingDir {
    /// Directory holding plaintext files and `metadata.json`
    pub path: PathBuf,

    /// Archive written next to the directory
    archive_path: PathBuf,

    /// Whether to delete local state on drop.
    pub(crate) cleanup_on_drop: bool,
}

impl WorkingDir {
    /// Creates `<parent>/<name>`, failing if it already exists.
    ///
    /// The guard is armed before creation, so a stale directory left by an
    /// interrupted run is removed even though this call fails.
    pub fn create(parent: &Path, name: &str) -> Result<Self, PipelineError> {
        let guard = Self {
            path: parent.join(name),
            archive_path: parent.join(format!("{}.zip", name)),
            cleanup_on_drop: true,
        };

        std::fs::create_dir_all(parent)?;
        std::fs::create_dir(&guard.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => PipelineError::WorkdirExists {
                path: guard.path.display().to_string(),
            },
            _ => PipelineError::Io(e),
        })?;

        info!(path = %guard.path.display(), "Working directory created");
        Ok(guard)
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Resolves `relative` against the working directory, rejecting any path
    /// that escapes it (path traversal guard).
    ///
    /// # Errors
    ///
    /// Returns `Err` if `relative` is absolute, empty, or contains `..`.
    pub fn safe_child(&self, relative: &Path) -> Result<PathBuf, PipelineError> {
        let rejected = || PipelineError::PathTraversal {
            attempted: relative.display().to_string(),
        };

        if relative.is_absolute() || relative.as_os_str().is_empty() {
            return Err(rejected());
        }

        // Component-level check (works even if the file doesn't exist yet)
        for component in relative.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(rejected());
                }
                Component::CurDir | Component::Normal(_) => {}
            }
        }

        Ok(self.path.join(relative))
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        if !self.cleanup_on_drop {
            return;
        }
        if self.path.exists() {
            match std::fs::remove_dir_all(&self.path) {
                Ok(()) => info!(path = %self.path.display(), "Working directory removed"),
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove working directory"
                ),
            }
        }
        if self.archive_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.archive_path) {
                warn!(
                    path = %self.archive_path.display(),
                    error = %e,
                    "Failed to remove archive"
                );
            }
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct HarvestReport {
    /// Item uuid -> normalized metadata, as written to `metadata.json`
    pub metadata: AggregateMetadata,

    /// Blob name the archive was uploaded under
    pub archive_name: String,

    pub stats: HarvestStats,
}

/// Statistics about the harvest run.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Collections traversed
    pub collections: usize,

    /// Distinct items in the aggregate document
    pub items: usize,

    /// Items marked `plaintext_available = ["Yes"]`
    pub plaintext_files: usize,

    /// Duplicate uuids overwritten while merging
    pub duplicates: usize,

    /// Size of the uploaded archive (bytes)
    pub archive_size_bytes: u64,

    /// Wall time of the whole run (milliseconds)
    pub total_duration_ms: u64,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Errors that end a harvest run. None of them are retried.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Repository request failed or returned an unexpected shape
    #[error("Repository request failed: {0}")]
    Client(#[from] ClientError),

    /// Archive upload failed
    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),

    /// The working directory is left over from an earlier run
    #[error("Working directory already exists: '{path}'")]
    WorkdirExists { path: String },

    /// A file name derived from remote data would escape the working directory
    #[error("Path traversal attempt rejected: '{attempted}'")]
    PathTraversal { attempted: String },

    /// Aggregate document serialization failed
    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Zip packaging failed
    #[error("Archive failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Item executor could not hand out a permit
    #[error("Executor error: {0}")]
    Executor(String),

    /// Blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    Task(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Single-pass harvest run over every configured collection.
///
/// # Example
///
/// ```ignore
/// use repository_harvester::{load_config, DspaceClient, LocalStore, HarvestPipeline};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("harvest.toml".as_ref())?;
///     let client = DspaceClient::new(&config.repository.base_url, &config.repository.document_host);
///     let pipeline = HarvestPipeline::new(client, LocalStore::new("/srv/blobs"));
///
///     let report = pipeline.execute(&config).await?;
///     println!("Harvested {} items", report.stats.items);
///     Ok(())
/// }
/// ```
pub struct HarvestPipeline<C, S>
where
    C: RepositoryClient,
    S: ObjectStore,
{
    client: C,

    store: S,

    /// Gates per-item work (default: one item at a time)
    executor: HarvestExecutor,

    progress: Box<dyn ProgressReporter>,
}

impl<C, S> HarvestPipeline<C, S>
where
    C: RepositoryClient,
    S: ObjectStore,
{
    /// Creates a sequential pipeline with silent progress.
    pub fn new(client: C, store: S) -> Self {
        Self {
            client,
            store,
            executor: HarvestExecutor::sequential(),
            progress: Box::new(SilentProgress),
        }
    }

    /// Sets how many items of a collection may be harvested at once.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.executor = HarvestExecutor::new(limit);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressReporter + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Executes one complete harvest run.
    ///
    /// 1. Create `<temp_dir>/<blob_name>`
    /// 2. Harvest every collection in configuration order, merging items into
    ///    the aggregate document
    /// 3. Write `metadata.json`, zip the directory, upload `<blob_name>.zip`
    ///    with overwrite enabled
    /// 4. Remove the directory and the archive, whatever the outcome
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`] raised by any stage; nothing is
    /// uploaded after a failure.
    #[instrument(skip_all, fields(collections = config.collections.len(), blob = %config.storage.blob_name))]
    pub async fn execute(&self, config: &Config) -> Result<HarvestReport, PipelineError> {
        let start = Instant::now();
        let workdir = WorkingDir::create(&config.harvest.temp_dir, &config.storage.blob_name)?;

        let result = self.run(&workdir, config, start).await;

        // Cleanup runs here for success and failure alike.
        drop(workdir);
        result
    }

    async fn run(
        &self,
        workdir: &WorkingDir,
        config: &Config,
        start: Instant,
    ) -> Result<HarvestReport, PipelineError> {
        let mut stats = HarvestStats::default();
        let mut aggregate = AggregateMetadata::new();
        let mut plaintext_written = HashSet::new();

        for collection in &config.collections {
            let harvested = collection::harvest_collection(
                &self.client,
                &self.executor,
                workdir,
                collection,
                self.progress.as_ref(),
            )
            .await?;
            stats.collections += 1;

            for item in harvested {
                if aggregate.contains_key(&item.uuid) {
                    warn!(item = %item.uuid, collection = %collection.label, "Duplicate item, keeping latest");
                    stats.duplicates += 1;
                }
                if item.plaintext_written {
                    plaintext_written.insert(item.uuid.clone());
                }
                aggregate.insert(item.uuid, item.metadata);
            }
        }

        stats.items = aggregate.len();
        // One `<uuid>.txt` per item, however often the item was listed.
        stats.plaintext_files = plaintext_written.len();

        info!(items = stats.items, "Writing metadata JSON");
        let metadata_path = workdir.safe_child(Path::new(METADATA_FILE))?;
        let json = serde_json::to_vec(&aggregate)?;
        tokio::fs::write(&metadata_path, &json).await?;

        info!("Zipping and uploading blob");
        let source = workdir.path.clone();
        let destination = workdir.archive_path().to_path_buf();
        stats.archive_size_bytes =
            tokio::task::spawn_blocking(move || archive::zip_directory(&source, &destination))
                .await
                .map_err(|e| PipelineError::Task(e.to_string()))??;

        let archive_name = config.storage.archive_name();
        let body = tokio::fs::read(workdir.archive_path()).await?;
        self.store
            .upload(&config.storage.container, &archive_name, body, true)
            .await?;

        stats.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            backend = self.store.backend(),
            container = %config.storage.container,
            blob = %archive_name,
            items = stats.items,
            plaintext_files = stats.plaintext_files,
            size_bytes = stats.archive_size_bytes,
            duration_ms = stats.total_duration_ms,
            "Harvest completed"
        );

        Ok(HarvestReport {
            metadata: aggregate,
            archive_name,
            stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
