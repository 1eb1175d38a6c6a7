//! Image filtering collaborator.
//!
//! # Data Flow
//! ```text
//! validated, reachable URL
//!     → FilterService::filter_image
//!         (jpeg.rs: download → decode → resize/greyscale → encode JPEG → write)
//!     → FilteredArtifact (unique local path, owned by one request)
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees the trait; tests substitute doubles
//! - The implementation owns cleanup of its own partial output on failure
//! - Every call produces a fresh artifact, even for an identical URL

pub mod jpeg;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use self::jpeg::{apply_filter, FilterSettings, ImageFilter};

/// A filtered image written to local storage.
///
/// Exclusively owned by the request that produced it.
#[derive(Debug, PartialEq, Eq)]
pub struct FilteredArtifact {
    path: PathBuf,
}

impl FilteredArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Errors raised by a filter implementation.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Fetching the source image failed.
    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    /// Source image exceeded the configured size cap.
    #[error("source image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    /// Decoding or encoding failed.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking transform task panicked or was cancelled.
    #[error("filter task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Implementation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Produces a filtered local copy of a remote image.
#[async_trait]
pub trait FilterService: Send + Sync {
    /// Filter the image at `url` and return the path of the new file.
    async fn filter_image(&self, url: &str) -> Result<FilteredArtifact, FilterError>;
}
