use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata key inspected for the access-rights predicate.
pub const RIGHTS_KEY: &str = "dc.rights";

/// Rights value marking an item whose full text may be retrieved.
pub const OPEN_ACCESS_MARKER: &str = "info:eu-repo/semantics/openAccess";

/// Media type of the plain-text bitstream representation.
pub const PLAIN_TEXT_MIME: &str = "text/plain";

/// Key recording whether a plaintext file was written for the item.
pub const PLAINTEXT_AVAILABLE: &str = "plaintext_available";

pub const PLAINTEXT_YES: &str = "Yes";
pub const PLAINTEXT_NO: &str = "No";

/// Name of the serialized aggregate document inside the working directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Page size requested when listing a collection's items.
pub const ITEM_PAGE_LIMIT: usize = 1000;

/// Metadata of one item: key -> values, both in first-seen order.
pub type ItemMetadata = IndexMap<String, Vec<String>>;

/// Item uuid -> normalized metadata for every harvested item.
pub type AggregateMetadata = IndexMap<String, ItemMetadata>;

/// A configured collection: operator-facing label plus remote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRef {
    pub label: String,
    pub id: String,
}

impl CollectionRef {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
        }
    }
}

/// Entry of the collection item listing. Only the uuid is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub uuid: String,
}

/// One `{key, value}` pair of an item's metadata listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// A file attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitstream {
    #[serde(rename = "mimeType")]
    pub mime_type: String,

    /// Server-relative link, resolved against the document host.
    #[serde(rename = "retrieveLink")]
    pub retrieve_link: String,
}
