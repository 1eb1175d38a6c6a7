//! Local filesystem deletion.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::cleanup::CleanupService;
use crate::observability::metrics;

/// Deletes artifacts from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileCleanup;

impl CleanupService for LocalFileCleanup {
    fn delete_files(&self, paths: &[PathBuf]) {
        for path in paths {
            match fs::remove_file(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Artifact deleted");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "Artifact already removed");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete artifact");
                    metrics::record_cleanup_failure();
                }
            }
        }
    }
}
