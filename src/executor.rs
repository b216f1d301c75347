use crate::harvest::PipelineError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

/// Bounds how many items are harvested at once.
///
/// With a single permit (the default) items run strictly one after another,
/// in the order their futures first ask for a permit.
pub struct HarvestExecutor {
    semaphore: Arc<Semaphore>,
    concurrency_limit: usize,
}

impl HarvestExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let concurrency_limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    #[instrument(skip(self, task))]
    pub async fn execute<F, T>(&self, item_id: &str, task: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| PipelineError::Executor(format!("Semaphore error: {}", e)))?;

        debug!("Starting item");
        let result = task.await;
        debug!(ok = result.is_ok(), "Finished item");
        result
    }
}

impl Default for HarvestExecutor {
    fn default() -> Self {
        Self::sequential()
    }
}
