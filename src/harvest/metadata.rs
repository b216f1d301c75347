//! Metadata normalization and per-item metadata fetch.

use tracing::debug;

use crate::harvest::PipelineError;
use crate::model::{ItemMetadata, MetadataEntry};
use crate::traits::RepositoryClient;

/// Pairs `keys[i]` with `values[i]` and groups the values by key.
///
/// Keys keep first-seen order and each key's values keep input order;
/// repeated values are not deduplicated.
///
/// # Panics
///
/// Panics if `keys` and `values` differ in length.
pub fn normalize_metadata<K, V>(keys: &[K], values: &[V]) -> ItemMetadata
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    assert_eq!(
        keys.len(),
        values.len(),
        "metadata keys and values must be positionally paired"
    );

    let mut metadata = ItemMetadata::new();
    for (key, value) in keys.iter().zip(values) {
        metadata
            .entry(key.as_ref().to_string())
            .or_default()
            .push(value.as_ref().to_string());
    }
    metadata
}

/// Normalizes the entries of one metadata listing.
pub fn metadata_from_entries(entries: Vec<MetadataEntry>) -> ItemMetadata {
    let (keys, values): (Vec<String>, Vec<String>) =
        entries.into_iter().map(|e| (e.key, e.value)).unzip();
    normalize_metadata(&keys, &values)
}

/// Fetches and normalizes the metadata of `item_id`.
pub async fn fetch_item_metadata<C>(client: &C, item_id: &str) -> Result<ItemMetadata, PipelineError>
where
    C: RepositoryClient + ?Sized,
{
    let entries = client.item_metadata(item_id).await?;
    debug!(item = item_id, entries = entries.len(), "Metadata fetched");
    Ok(metadata_from_entries(entries))
}
