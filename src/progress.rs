//! Harvest progress reporting.
//!
//! Progress goes to **stderr** and is independent of `tracing` output.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Items per progress line.
const DOTS_PER_LINE: usize = 50;

const RULER: &str = " ---+--- 1 ---+--- 2 ---+--- 3 ---+--- 4 ---+--- 5";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarvestEvent {
    /// About to request the item listing for a collection.
    CollectionListing { label: String },
    /// Item listing for a collection returned `total` items.
    CollectionStarted { label: String, total: usize },
    /// One more item of the collection finished.
    ItemHarvested { label: String, uuid: String },
    CollectionFinished { label: String, total: usize },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: HarvestEvent);
}

/// Emits nothing.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _event: HarvestEvent) {}
}

/// One dot per item, with the running count every fifty items:
///
/// ```text
/// Getting list of items in collection 'theses'
/// Retrieving metadata and downloading text for all 120 items
///  ---+--- 1 ---+--- 2 ---+--- 3 ---+--- 4 ---+--- 5
/// .................................................. 50
/// .................................................. 100
/// ....................
/// ```
#[derive(Default)]
pub struct DotProgress {
    done: AtomicUsize,
}

impl DotProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, event: &HarvestEvent) -> String {
        match event {
            HarvestEvent::CollectionListing { label } => {
                format!("Getting list of items in collection '{}'\n", label)
            }
            HarvestEvent::CollectionStarted { total, .. } => {
                self.done.store(0, Ordering::SeqCst);
                format!(
                    "Retrieving metadata and downloading text for all {} items\n{}\n",
                    total, RULER
                )
            }
            HarvestEvent::ItemHarvested { .. } => {
                let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
                if n % DOTS_PER_LINE == 0 {
                    format!(". {}\n", n)
                } else {
                    ".".to_string()
                }
            }
            HarvestEvent::CollectionFinished { total, .. } => {
                if *total % DOTS_PER_LINE == 0 {
                    String::new()
                } else {
                    "\n".to_string()
                }
            }
        }
    }
}

impl ProgressReporter for DotProgress {
    fn report(&self, event: HarvestEvent) {
        let out = self.render(&event);
        if out.is_empty() {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(out.as_bytes());
        let _ = stderr.flush();
    }
}
