//! Open-access plaintext retrieval.

use std::path::Path;

use tracing::{debug, info};

use crate::harvest::{PipelineError, WorkingDir};
use crate::model::{ItemMetadata, PLAINTEXT_AVAILABLE, PLAINTEXT_YES, PLAIN_TEXT_MIME};
use crate::traits::RepositoryClient;

/// Downloads the first `text/plain` bitstream of `item_id` into
/// `<workdir>/<item_id>.txt` and marks `metadata` with
/// `plaintext_available = ["Yes"]`.
///
/// The response bytes are written unmodified. When the item has no plain-text
/// bitstream nothing is written, `metadata` is left untouched and `false` is
/// returned.
pub async fn retrieve_plaintext<C>(
    client: &C,
    workdir: &WorkingDir,
    item_id: &str,
    metadata: &mut ItemMetadata,
) -> Result<bool, PipelineError>
where
    C: RepositoryClient + ?Sized,
{
    let bitstreams = client.item_bitstreams(item_id).await?;
    let Some(plaintext) = bitstreams.iter().find(|b| b.mime_type == PLAIN_TEXT_MIME) else {
        debug!(item = item_id, bitstreams = bitstreams.len(), "No plain-text bitstream");
        return Ok(false);
    };

    let target = workdir.safe_child(Path::new(&format!("{}.txt", item_id)))?;
    let content = client.retrieve(&plaintext.retrieve_link).await?;
    tokio::fs::write(&target, &content).await?;

    metadata.insert(
        PLAINTEXT_AVAILABLE.to_string(),
        vec![PLAINTEXT_YES.to_string()],
    );
    info!(item = item_id, size_bytes = content.len(), "Plaintext written");
    Ok(true)
}
