pub mod client;
pub mod config;
pub mod executor;
pub mod harvest;
pub mod model;
pub mod progress;
pub mod storage;
pub mod traits;

// Re-export common types for convenience
pub use client::DspaceClient;
pub use config::{load_config, Config, ConfigError, StorageBackend};
pub use executor::*;
pub use harvest::{
    HarvestPipeline, HarvestReport, HarvestStats, HarvestedItem, PipelineError, WorkingDir,
};
pub use model::*;
pub use progress::{DotProgress, HarvestEvent, ProgressReporter, SilentProgress};
pub use storage::{AzureBlobStore, LocalStore};
pub use traits::*;
