//! Per-collection traversal.

use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::executor::HarvestExecutor;
use crate::harvest::{fetch_item_metadata, retrieve_plaintext, PipelineError, WorkingDir};
use crate::model::{
    CollectionRef, Item, ItemMetadata, ITEM_PAGE_LIMIT, OPEN_ACCESS_MARKER, PLAINTEXT_AVAILABLE,
    PLAINTEXT_NO, RIGHTS_KEY,
};
use crate::progress::{HarvestEvent, ProgressReporter};
use crate::traits::RepositoryClient;

/// One harvested item, ready to merge into the aggregate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestedItem {
    pub uuid: String,
    pub metadata: ItemMetadata,

    /// Whether `<uuid>.txt` was written to the working directory
    pub plaintext_written: bool,
}

/// True when the item's `dc.rights` values include the open-access marker.
/// Items without `dc.rights` are not open access.
pub fn is_open_access(metadata: &ItemMetadata) -> bool {
    metadata
        .get(RIGHTS_KEY)
        .is_some_and(|rights| rights.iter().any(|r| r == OPEN_ACCESS_MARKER))
}

/// Fetches one item's metadata, retrieves its plaintext when open access,
/// and defaults `plaintext_available` to `["No"]`.
pub async fn harvest_item<C>(
    client: &C,
    workdir: &WorkingDir,
    item_id: &str,
) -> Result<HarvestedItem, PipelineError>
where
    C: RepositoryClient + ?Sized,
{
    let mut metadata = fetch_item_metadata(client, item_id).await?;
    let plaintext_written = if is_open_access(&metadata) {
        retrieve_plaintext(client, workdir, item_id, &mut metadata).await?
    } else {
        false
    };
    metadata
        .entry(PLAINTEXT_AVAILABLE.to_string())
        .or_insert_with(|| vec![PLAINTEXT_NO.to_string()]);
    Ok(HarvestedItem {
        uuid: item_id.to_string(),
        metadata,
        plaintext_written,
    })
}

async fn harvest_listed_item<C>(
    client: &C,
    executor: &HarvestExecutor,
    workdir: &WorkingDir,
    collection: &CollectionRef,
    progress: &dyn ProgressReporter,
    item: &Item,
) -> Result<HarvestedItem, PipelineError>
where
    C: RepositoryClient + ?Sized,
{
    let harvested = executor
        .execute(&item.uuid, harvest_item(client, workdir, &item.uuid))
        .await?;
    progress.report(HarvestEvent::ItemHarvested {
        label: collection.label.clone(),
        uuid: item.uuid.clone(),
    });
    Ok(harvested)
}

/// Harvests every item listed for `collection`.
///
/// Lists up to [`ITEM_PAGE_LIMIT`] items and returns them harvested, in
/// listing order. The first failing item aborts the collection.
#[instrument(skip_all, fields(collection = %collection.label))]
pub async fn harvest_collection<C>(
    client: &C,
    executor: &HarvestExecutor,
    workdir: &WorkingDir,
    collection: &CollectionRef,
    progress: &dyn ProgressReporter,
) -> Result<Vec<HarvestedItem>, PipelineError>
where
    C: RepositoryClient + ?Sized,
{
    progress.report(HarvestEvent::CollectionListing {
        label: collection.label.clone(),
    });
    info!(collection_id = %collection.id, "Getting list of items in collection");
    let items = client.list_items(&collection.id, ITEM_PAGE_LIMIT).await?;
    info!(items = items.len(), "Retrieving metadata and downloading text");

    progress.report(HarvestEvent::CollectionStarted {
        label: collection.label.clone(),
        total: items.len(),
    });

    let harvested = if executor.concurrency_limit() == 1 {
        let mut harvested = Vec::with_capacity(items.len());
        for item in &items {
            harvested.push(
                harvest_listed_item(client, executor, workdir, collection, progress, item).await?,
            );
        }
        harvested
    } else {
        try_join_all(items.iter().map(|item| {
            harvest_listed_item(client, executor, workdir, collection, progress, item)
        }))
        .await?
    };

    progress.report(HarvestEvent::CollectionFinished {
        label: collection.label.clone(),
        total: items.len(),
    });
    Ok(harvested)
}
