use crate::model::{Bitstream, Item, MetadataEntry};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Unexpected response shape from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Upload of {container}/{blob} failed: {source}")]
    Transport {
        container: String,
        blob: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Upload of {container}/{blob} rejected with HTTP {status}: {body}")]
    Rejected {
        container: String,
        blob: String,
        status: u16,
        body: String,
    },
    #[error("Blob {container}/{blob} already exists")]
    AlreadyExists { container: String, blob: String },
    #[error("Missing storage credentials: environment variable {0} is not set")]
    MissingCredentials(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Read-only view of the remote repository REST API.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Lists up to `limit` items of a collection, in the server's order.
    async fn list_items(&self, collection_id: &str, limit: usize)
        -> Result<Vec<Item>, ClientError>;

    /// Lists the flat metadata entries of one item.
    async fn item_metadata(&self, item_id: &str) -> Result<Vec<MetadataEntry>, ClientError>;

    /// Lists the file attachments of one item.
    async fn item_bitstreams(&self, item_id: &str) -> Result<Vec<Bitstream>, ClientError>;

    /// Downloads the raw bytes behind a bitstream's retrieve link.
    async fn retrieve(&self, retrieve_link: &str) -> Result<Vec<u8>, ClientError>;
}

/// Durable object storage receiving the finished archive.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logging (e.g., "azure_blob", "local").
    fn backend(&self) -> &str;

    async fn upload(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError>;
}
