//! Pipeline error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::filter::FilterError;
use crate::pipeline::Stage;

/// Why a request left the pipeline before a body was sent.
///
/// `Display` is the exact client-facing message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image_url is a required query")]
    MissingImageUrl,

    #[error("your value \"{0}\" is not a valid URL")]
    InvalidUrl(String),

    #[error("Image does not exist or there was a problem while fetching it. Try again later")]
    Unreachable,

    #[error("There was a problem while filtering the image")]
    Filter(#[source] FilterError),
}

impl PipelineError {
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::MissingImageUrl | PipelineError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            PipelineError::Unreachable | PipelineError::Filter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MissingImageUrl | PipelineError::InvalidUrl(_) => Stage::Validating,
            PipelineError::Unreachable => Stage::Probing,
            PipelineError::Filter(_) => Stage::Filtering,
        }
    }

    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            PipelineError::MissingImageUrl | PipelineError::InvalidUrl(_) => "invalid",
            PipelineError::Unreachable => "unreachable",
            PipelineError::Filter(_) => "filter_failed",
        }
    }
}
