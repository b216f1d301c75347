//! Harvest module - repository traversal, aggregation, and publication.
//!
//! - **Metadata**: flat entry normalization and per-item fetch via [`metadata`]
//! - **Documents**: open-access plaintext retrieval via [`document`]
//! - **Collections**: per-collection item traversal via [`collection`]
//! - **Archive**: zip packaging of the working directory via [`archive`]
//! - **Pipeline**: the run orchestrator and its cleanup guard via [`pipeline`]

pub mod archive;
pub mod collection;
pub mod document;
pub mod metadata;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod mock;

pub use collection::{harvest_collection, harvest_item, is_open_access, HarvestedItem};
pub use document::retrieve_plaintext;
pub use metadata::{fetch_item_metadata, metadata_from_entries, normalize_metadata};
pub use pipeline::{HarvestPipeline, HarvestReport, HarvestStats, PipelineError, WorkingDir};
