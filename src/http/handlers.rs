use std::time::Instant;

use axum::extract::{RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::PipelineError;

pub const USAGE: &str = "try GET /filteredimage?image_url={{}}";

pub async fn root() -> &'static str {
    USAGE
}

/// `GET /filteredimage?image_url=<URL>`
pub async fn filtered_image(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    match state.pipeline.run(query.as_deref(), &request_id).await {
        Ok(response) => {
            metrics::record_request("ok", start);
            response
        }
        Err(err) => {
            match &err {
                PipelineError::Filter(source) => tracing::error!(
                    request_id = %request_id,
                    stage = %err.stage(),
                    error = %source,
                    "Filter failed"
                ),
                _ => tracing::info!(
                    request_id = %request_id,
                    stage = %err.stage(),
                    reason = %err,
                    "Request rejected"
                ),
            }
            metrics::record_request(err.outcome(), start);
            err.into_response()
        }
    }
}
