#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use repository_harvester::{
    Bitstream, ClientError, Config, Item, MetadataEntry, ObjectStore, RepositoryClient,
    StorageError,
};

pub const OPEN: &str = "info:eu-repo/semantics/openAccess";
pub const CLOSED: &str = "info:eu-repo/semantics/closedAccess";

/// In-memory repository with injectable failures.
///
/// Mirrors the builder API of the crate's unit-test mock, which is
/// `cfg(test)` and therefore not visible to integration tests.
#[derive(Default)]
pub struct MockRepository {
    items: HashMap<String, Vec<String>>,
    metadata: HashMap<String, Vec<MetadataEntry>>,
    bitstreams: HashMap<String, Vec<Bitstream>>,
    documents: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
}

impl MockRepository {
    pub fn with_collection(mut self, id: &str, uuids: &[&str]) -> Self {
        self.items
            .insert(id.to_string(), uuids.iter().map(|u| u.to_string()).collect());
        self
    }

    pub fn with_metadata(mut self, uuid: &str, entries: &[(&str, &str)]) -> Self {
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

    pub fn with_bitstream(mut self, uuid: &str, mime: &str, link: &str, body: &[u8]) -> Self {
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

    pub fn failing_metadata(mut self, uuid: &str) -> Self {
        self.failing.insert(uuid.to_string());
        self
    }
}

#[async_trait]
impl RepositoryClient for MockRepository {
    async fn list_items(&self, collection_id: &str, limit: usize) -> Result<Vec<Item>, ClientError> {
        assert_eq!(limit, 1000);
        let uuids = self.items.get(collection_id).ok_or(ClientError::Status {
            url: format!("collections/{}/items", collection_id),
            status: 404,
        })?;
        Ok(uuids.iter().map(|uuid| Item { uuid: uuid.clone() }).collect())
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
        self.documents
            .get(retrieve_link)
            .cloned()
            .ok_or(ClientError::Status {
                url: retrieve_link.to_string(),
                status: 404,
            })
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub container: String,
    pub blob: String,
    pub body: Vec<u8>,
    pub overwrite: bool,
}

/// Object store that keeps every upload in memory.
#[derive(Default)]
pub struct RecordingStore {
    pub uploads: Mutex<Vec<Upload>>,
    pub reject: bool,
}

impl RecordingStore {
    pub fn rejecting() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    fn backend(&self) -> &str {
        "recording"
    }

    async fn upload(
        &self,
        container: &str,
        blob: &str,
        body: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), StorageError> {
        if self.reject {
            return Err(StorageError::Rejected {
                container: container.to_string(),
                blob: blob.to_string(),
                status: 403,
                body: "AuthenticationFailed".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(Upload {
            container: container.to_string(),
            blob: blob.to_string(),
            body,
            overwrite,
        });
        Ok(())
    }
}

/// Configuration harvesting `collections` into `temp_dir`.
pub fn config(temp_dir: &Path, collections: &[(&str, &str)]) -> Config {
    let mut toml = format!(
        r#"
[repository]
base_url = "https://repo.example.edu/rest/"
document_host = "https://repo.example.edu"

[harvest]
temp_dir = '{}'

[storage]
container = "raw-data"
blob_name = "raw_theses"

[storage.backend]
kind = "local"
root = '{}'
"#,
        temp_dir.display(),
        temp_dir.join("blobs").display()
    );
    for (label, id) in collections {
        toml.push_str(&format!("\n[[collections]]\nlabel = \"{}\"\nid = \"{}\"\n", label, id));
    }
    Config::from_toml_str(&toml).unwrap()
}

/// Entry name -> content of a zip archive held in memory.
pub fn unzip(body: &[u8]) -> HashMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body)).unwrap();
    let mut entries = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        entries.insert(file.name().to_string(), content);
    }
    entries
}
