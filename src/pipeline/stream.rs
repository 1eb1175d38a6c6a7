//! Response streaming with cleanup bound to the body's lifetime.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::Request;
use axum::response::Response;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::cleanup::{CleanupGuard, CleanupService, TransferOutcome};
use crate::filter::FilteredArtifact;

/// Body stream that carries the [`CleanupGuard`] until hyper drops it.
pub struct GuardedStream {
    inner: BoxStream<'static, Result<Bytes, axum::Error>>,
    guard: CleanupGuard,
}

impl GuardedStream {
    pub fn new(inner: BoxStream<'static, Result<Bytes, axum::Error>>, guard: CleanupGuard) -> Self {
        Self { inner, guard }
    }
}

impl Stream for GuardedStream {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.inner.poll_next_unpin(cx);
        match &polled {
            Poll::Ready(None) if this.guard.outcome() == TransferOutcome::Aborted => {
                this.guard.set_outcome(TransferOutcome::Completed);
            }
            Poll::Ready(Some(Err(_))) => this.guard.set_outcome(TransferOutcome::Failed),
            _ => {}
        }
        polled
    }
}

/// Stream `artifact` as the response body.
///
/// The artifact is deleted once the body finishes, fails, or is dropped.
/// Content-Type comes from the file extension.
pub async fn send_artifact(
    artifact: FilteredArtifact,
    cleanup: Arc<dyn CleanupService>,
    request_id: &str,
) -> Response {
    let path = artifact.path().to_path_buf();
    let mut guard = CleanupGuard::new(artifact, cleanup, request_id);

    let response = match ServeFile::new(&path).oneshot(Request::new(Body::empty())).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if !response.status().is_success() {
        tracing::warn!(
            request_id = %request_id,
            path = %path.display(),
            status = %response.status(),
            "Artifact could not be sent"
        );
        guard.set_outcome(TransferOutcome::Failed);
    }

    let (parts, body) = response.into_parts();
    let stream = GuardedStream::new(Body::new(body).into_data_stream().boxed(), guard);
    Response::from_parts(parts, Body::from_stream(stream))
}
