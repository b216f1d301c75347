//! [`ObjectStore`] backends.
//!
//! - [`AzureBlobStore`] uploads block blobs through the Blob REST API,
//!   authorized with a SAS token read from the environment.
//! - [`LocalStore`] writes objects below a local root directory.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::traits::{ObjectStore, StorageError};

const AZURE_API_VERSION: &str = "2021-08-06";

/// Azure Blob Storage sink using a shared access signature.
pub struct AzureBlobStore {
    http: reqwest::Client,
    account_url: String,
    sas_token: String,
}

impl AzureBlobStore {
    pub fn new(account_url: impl Into<String>, sas_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            account_url: account_url.into().trim_end_matches('/').to_string(),
            sas_token: sas_token.into().trim_start_matches('?').to_string(),
        }
    }

    /// Reads the SAS token from the environment variable `var`.
    pub fn from_env(account_url: impl Into<String>, var: &str) -> Result<Self, StorageError> {
        let token =
            std::env::var(var).map_err(|_| StorageError::MissingCredentials(var.to_string()))?;
        Ok(Self::new(account_url, token))
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        format!(
            "{}/{}/{}?{}",
            self.account_url, container, blob, self.sas_token
        )
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    fn backend(&self) -> &str {
        "azure_blob"
    }

    async fn upload(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let size = body.len();
        let mut request = self
            .http
            .put(self.blob_url(container, blob))
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-version", AZURE_API_VERSION)
            .header("Content-Type", "application/zip")
            .body(body);
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }

        let response = request
            .send()
            .await
            .map_err(|source| StorageError::Transport {
                container: container.to_string(),
                blob: blob.to_string(),
                source,
            })?;

        let status = response.status();
        if status.as_u16() == 409 && !overwrite {
            return Err(StorageError::AlreadyExists {
                container: container.to_string(),
                blob: blob.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                container: container.to_string(),
                blob: blob.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        info!(container, blob, size_bytes = size, "Blob uploaded");
        Ok(())
    }
}

/// Filesystem sink storing objects at `<root>/<container>/<blob>`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, container: &str, blob: &str) -> PathBuf {
        self.root.join(container).join(blob)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend(&self) -> &str {
        "local"
    }

    async fn upload(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        let path = self.object_path(container, blob);
        if !overwrite && tokio::fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists {
                container: container.to_string(),
                blob: blob.to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;

        info!(path = %path.display(), size_bytes = body.len(), "Object stored");
        Ok(())
    }
}
