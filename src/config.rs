//! Run configuration loaded from a TOML file.
//!
//! The configuration is read once at startup and handed to
//! [`HarvestPipeline::execute`](crate::harvest::HarvestPipeline::execute)
//! by reference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::CollectionRef;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub repository: RepositoryConfig,
    pub harvest: HarvestConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub collections: Vec<CollectionRef>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    /// REST API base address.
    pub base_url: String,
    /// Host that bitstream retrieve links are resolved against.
    pub document_host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HarvestConfig {
    /// Parent directory of the working directory and the archive.
    pub temp_dir: PathBuf,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub container: String,
    /// Working directory name; the archive is uploaded as `<blob_name>.zip`.
    pub blob_name: String,
    pub backend: StorageBackend,
}

impl StorageConfig {
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.blob_name)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    AzureBlob {
        account_url: String,
        #[serde(default = "default_sas_token_env")]
        sas_token_env: String,
    },
    Local {
        root: PathBuf,
    },
}

fn default_sas_token_env() -> String {
    "AZURE_STORAGE_SAS_TOKEN".to_string()
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("repository.base_url must not be empty".into()));
        }
        if self.repository.document_host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "repository.document_host must not be empty".into(),
            ));
        }
        if self.harvest.concurrency == 0 {
            return Err(ConfigError::Invalid("harvest.concurrency must be >= 1".into()));
        }
        if self.storage.container.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.container must not be empty".into()));
        }

        let blob_name = &self.storage.blob_name;
        let single_component = Path::new(blob_name).components().count() == 1
            && !blob_name.contains(['/', '\\'])
            && blob_name != "."
            && blob_name != "..";
        if blob_name.trim().is_empty() || !single_component {
            return Err(ConfigError::Invalid(format!(
                "storage.blob_name must be a plain file name, got '{}'",
                blob_name
            )));
        }

        let mut labels = HashSet::new();
        for collection in &self.collections {
            if !labels.insert(collection.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate collection label '{}'",
                    collection.label
                )));
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&content)
}
