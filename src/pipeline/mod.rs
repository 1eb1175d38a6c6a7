//! Request-to-file delivery pipeline.
//!
//! # Data Flow
//! ```text
//! GET /filteredimage?image_url=...
//!     → validate.rs   (Validating: shape check, no I/O)
//!     → probe.rs      (Probing: one HEAD request)
//!     → FilterService (Filtering: produces a unique local artifact)
//!     → stream.rs     (Sending: ServeFile body wrapped with a CleanupGuard)
//!     → CleanupGuard  (Cleaning: on body completion, error or drop)
//! ```
//!
//! Validating, Probing and Filtering short-circuit to an error response.
//! Sending is only reached with an artifact in hand, and Cleaning always
//! follows it.

pub mod error;
pub mod probe;
pub mod stream;
pub mod validate;

use std::fmt;
use std::sync::Arc;

use axum::response::Response;

use crate::cleanup::CleanupService;
use crate::filter::FilterService;

pub use error::PipelineError;
pub use probe::Prober;
pub use validate::{is_valid_url, ImageRequest};

/// Per-request pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Probing,
    Filtering,
    Sending,
    Cleaning,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Probing => "probing",
            Stage::Filtering => "filtering",
            Stage::Sending => "sending",
            Stage::Cleaning => "cleaning",
        };
        f.write_str(name)
    }
}

/// The endpoint's stage sequencing, with its collaborators injected.
#[derive(Clone)]
pub struct ImagePipeline {
    prober: Prober,
    filter: Arc<dyn FilterService>,
    cleanup: Arc<dyn CleanupService>,
}

impl ImagePipeline {
    pub fn new(
        prober: Prober,
        filter: Arc<dyn FilterService>,
        cleanup: Arc<dyn CleanupService>,
    ) -> Self {
        Self {
            prober,
            filter,
            cleanup,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// On `Ok`, the returned response owns the artifact; it is deleted when
    /// the body is done with, however that happens.
    pub async fn run(
        &self,
        raw_query: Option<&str>,
        request_id: &str,
    ) -> Result<Response, PipelineError> {
        let request = ImageRequest::from_query(raw_query)?;
        tracing::debug!(
            request_id = %request_id,
            stage = %Stage::Validating,
            image_url = %request.image_url(),
            "Request validated"
        );
        let url = request.fetch_url();

        tracing::debug!(request_id = %request_id, stage = %Stage::Probing, url = %url, "Probing image");
        if !self.prober.is_reachable(&url).await {
            return Err(PipelineError::Unreachable);
        }

        tracing::debug!(request_id = %request_id, stage = %Stage::Filtering, url = %url, "Filtering image");
        let artifact = self
            .filter
            .filter_image(&url)
            .await
            .map_err(PipelineError::Filter)?;

        tracing::debug!(
            request_id = %request_id,
            stage = %Stage::Sending,
            path = %artifact.path().display(),
            "Sending artifact"
        );
        Ok(stream::send_artifact(artifact, Arc::clone(&self.cleanup), request_id).await)
    }
}
