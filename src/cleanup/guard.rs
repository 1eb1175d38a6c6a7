//! Drop guard that runs cleanup exactly once.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cleanup::{CleanupService, TransferOutcome};
use crate::filter::FilteredArtifact;
use crate::observability::metrics;
use crate::pipeline::Stage;

/// Owns a request's Cleanup Set. Deletes it when dropped.
///
/// The outcome defaults to [`TransferOutcome::Aborted`]; whoever drives the
/// transfer marks it completed or failed before letting go.
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
    outcome: TransferOutcome,
    service: Arc<dyn CleanupService>,
    request_id: String,
}

impl CleanupGuard {
    /// Take ownership of `artifact` for deletion.
    pub fn new(
        artifact: FilteredArtifact,
        service: Arc<dyn CleanupService>,
        request_id: impl Into<String>,
    ) -> Self {
        metrics::artifact_acquired();
        Self {
            paths: vec![artifact.into_path()],
            outcome: TransferOutcome::Aborted,
            service,
            request_id: request_id.into(),
        }
    }

    pub fn outcome(&self) -> TransferOutcome {
        self.outcome
    }

    pub fn set_outcome(&mut self, outcome: TransferOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let paths = std::mem::take(&mut self.paths);
        metrics::artifact_released();
        metrics::record_transfer(self.outcome.as_str());

        tracing::debug!(
            request_id = %self.request_id,
            stage = %Stage::Cleaning,
            outcome = %self.outcome,
            files = paths.len(),
            "Transfer finished, cleaning up"
        );

        let service = Arc::clone(&self.service);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || service.delete_files(&paths));
            }
            Err(_) => service.delete_files(&paths),
        }
    }
}
