//! HTTP implementation of [`RepositoryClient`] for DSpace-style REST APIs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{Bitstream, Item, MetadataEntry};
use crate::traits::{ClientError, RepositoryClient};

/// Repository client backed by `reqwest`.
///
/// Requests block until the server answers or the transport fails; no
/// timeout or retry is applied.
#[derive(Debug, Clone)]
pub struct DspaceClient {
    http: reqwest::Client,
    base_url: String,
    document_host: String,
}

impl DspaceClient {
    /// `base_url` is the REST root (e.g. `https://repo.example.edu/rest`),
    /// `document_host` the origin retrieve links are resolved against.
    pub fn new(base_url: impl Into<String>, document_host: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, document_host)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        document_host: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            document_host: document_host.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn document_url(&self, retrieve_link: &str) -> String {
        if retrieve_link.starts_with('/') {
            format!("{}{}", self.document_host, retrieve_link)
        } else {
            format!("{}/{}", self.document_host, retrieve_link)
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RepositoryClient for DspaceClient {
    async fn list_items(
        &self,
        collection_id: &str,
        limit: usize,
    ) -> Result<Vec<Item>, ClientError> {
        let url = self.endpoint(&format!("collections/{}/items?limit={}", collection_id, limit));
        self.get_json(&url).await
    }

    async fn item_metadata(&self, item_id: &str) -> Result<Vec<MetadataEntry>, ClientError> {
        let url = self.endpoint(&format!("items/{}/metadata", item_id));
        self.get_json(&url).await
    }

    async fn item_bitstreams(&self, item_id: &str) -> Result<Vec<Bitstream>, ClientError> {
        let url = self.endpoint(&format!("items/{}/bitstreams", item_id));
        self.get_json(&url).await
    }

    async fn retrieve(&self, retrieve_link: &str) -> Result<Vec<u8>, ClientError> {
        let url = self.document_url(retrieve_link);
        self.get_bytes(&url).await
    }
}
