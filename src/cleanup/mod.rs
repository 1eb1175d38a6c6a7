//! Temporary artifact cleanup.
//!
//! # Data Flow
//! ```text
//! FilteredArtifact
//!     → guard.rs (CleanupGuard owns the Cleanup Set)
//!     → moved into the response body stream
//!     → body finished / errored / dropped by client
//!     → Drop → CleanupService::delete_files (local.rs)
//! ```
//!
//! # Design Decisions
//! - Deletion is tied to the guard's lifetime, so it runs exactly once on every exit path
//! - Failures are logged and counted, never surfaced to the client
//! - A path that is already gone counts as deleted

pub mod guard;
pub mod local;

use std::fmt;
use std::path::PathBuf;

pub use guard::CleanupGuard;
pub use local::LocalFileCleanup;

/// Bulk, best-effort file deletion.
pub trait CleanupService: Send + Sync {
    /// Delete every path. Never fails; problems are only observable locally.
    fn delete_files(&self, paths: &[PathBuf]);
}

/// How the response transfer that owned a Cleanup Set ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The body was streamed to its end.
    Completed,
    /// Reading the artifact failed mid-stream.
    Failed,
    /// The body was dropped before it finished (client went away, send error).
    Aborted,
}

impl TransferOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOutcome::Completed => "completed",
            TransferOutcome::Failed => "failed",
            TransferOutcome::Aborted => "aborted",
        }
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
