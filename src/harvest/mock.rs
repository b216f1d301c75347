//! In-memory repository used by the harvest unit tests.
//!
//! Compiled only under `cfg(test)`, so `tests/common` keeps its own copy
//! with the same builder names.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::{Bitstream, Item, MetadataEntry};
use crate::traits::{ClientError, RepositoryClient};

#[derive(Default)]
pub(crate) struct MockRepository {
    items: HashMap<String, Vec<String>>,
    metadata: HashMap<String, Vec<MetadataEntry>>,
    bitstreams: HashMap<String, Vec<Bitstream>>,
    documents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    pub(crate) retrieved: Mutex<Vec<String>>,
}

impl MockRepository {
    pub(crate) fn with_collection(mut self, id: &str, uuids: &[&str]) -> Self {
        self.items
            .insert(id.to_string(), uuids.iter().map(|u| u.to_string()).collect());
        self
    }

    pub(crate) fn with_metadata(mut self, uuid: &str, entries: &[(&str, &str)]) -> Self {
        self.metadata.insert(
            uuid.to_string(),
            entries
                .iter()
                .map(|(k, v)| MetadataEntry {
                    key: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        );
        self
    }

    pub(crate) fn with_bitstream(mut self, uuid: &str, mime: &str, link: &str, body: &[u8]) -> Self {
        self.bitstreams
            .entry(uuid.to_string())
            .or_default()
            .push(Bitstream {
                mime_type: mime.to_string(),
                retrieve_link: link.to_string(),
            });
        self.documents.insert(link.to_string(), body.to_vec());
        self
    }

    pub(crate) fn failing_metadata(mut self, uuid: &str) -> Self {
        self.failing.insert(uuid.to_string());
        self
    }
}

fn not_found(url: String) -> ClientError {
    ClientError::Status { url, status: 404 }
}

#[async_trait]
impl RepositoryClient for MockRepository {
    async fn list_items(&self, collection_id: &str, limit: usize) -> Result<Vec<Item>, ClientError> {
        let uuids = self
            .items
            .get(collection_id)
            .ok_or_else(|| not_found(format!("collections/{}/items", collection_id)))?;
        Ok(uuids
            .iter()
            .take(limit)
            .map(|uuid| Item { uuid: uuid.clone() })
            .collect())
    }

    async fn item_metadata(&self, item_id: &str) -> Result<Vec<MetadataEntry>, ClientError> {
        if self.failing.contains(item_id) {
            return Err(ClientError::Unknown("connection reset by peer".to_string()));
        }
        Ok(self.metadata.get(item_id).cloned().unwrap_or_default())
    }

    async fn item_bitstreams(&self, item_id: &str) -> Result<Vec<Bitstream>, ClientError> {
        Ok(self.bitstreams.get(item_id).cloned().unwrap_or_default())
    }

    async fn retrieve(&self, retrieve_link: &str) -> Result<Vec<u8>, ClientError> {
        self.retrieved.lock().unwrap().push(retrieve_link.to_string());
        self.documents
            .get(retrieve_link)
            .cloned()
            .ok_or_else(|| not_found(retrieve_link.to_string()))
    }
}
