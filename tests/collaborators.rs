//! Pipeline behaviour with substituted filter and cleanup collaborators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use filtered_image_server::cleanup::CleanupService;
use filtered_image_server::config::ServiceConfig;
use filtered_image_server::filter::{FilterError, FilterService, FilteredArtifact};
use filtered_image_server::HttpServer;

mod common;

/// Writes `payload` to a fresh file per call and counts calls.
struct StaticFilter {
    dir: PathBuf,
    payload: Vec<u8>,
    calls: AtomicUsize,
}

impl StaticFilter {
    fn new(dir: &Path, payload: Vec<u8>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            payload,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FilterService for StaticFilter {
    async fn filter_image(&self, _url: &str) -> Result<FilteredArtifact, FilterError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let path = self.dir.join(format!("filtered.{}.jpg", n));
        tokio::fs::write(&path, &self.payload).await?;
        Ok(FilteredArtifact::new(path))
    }
}

struct FailingFilter;

#[async_trait]
impl FilterService for FailingFilter {
    async fn filter_image(&self, _url: &str) -> Result<FilteredArtifact, FilterError> {
        Err(FilterError::Other("filter exploded".into()))
    }
}

/// Records every deletion request, then really deletes.
#[derive(Default)]
struct RecordingCleanup {
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl RecordingCleanup {
    fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }
}

impl CleanupService for RecordingCleanup {
    fn delete_files(&self, paths: &[PathBuf]) {
        self.calls.lock().unwrap().push(paths.to_vec());
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.upstream.use_system_proxy = false;
    config
}

#[tokio::test]
async fn test_validation_failures_never_reach_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let filter = Arc::new(StaticFilter::new(dir.path(), b"x".to_vec()));
    let cleanup = Arc::new(RecordingCleanup::default());
    let server = HttpServer::with_services(config(), filter.clone(), cleanup.clone()).unwrap();

    for uri in ["/filteredimage?image_url=", "/filteredimage?image_url=htp:/bad"] {
        let response = server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        assert!(response.headers().contains_key("x-request-id"));
    }

    assert_eq!(filter.calls.load(Ordering::SeqCst), 0);
    assert!(cleanup.calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_never_invokes_filter() {
    let nothing = common::closed_addr().await;
    let dir = tempfile::tempdir().unwrap();
    let filter = Arc::new(StaticFilter::new(dir.path(), b"x".to_vec()));
    let cleanup = Arc::new(RecordingCleanup::default());
    let server = HttpServer::with_services(config(), filter.clone(), cleanup.clone()).unwrap();

    let uri = format!("/filteredimage?image_url=http://{}/a.png", nothing);
    let response = server
        .router()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(filter.calls.load(Ordering::SeqCst), 0);
    assert!(cleanup.calls().is_empty());
}

#[tokio::test]
async fn test_filter_failure_is_500_without_cleanup() {
    let origin = common::start_image_origin().await;
    let cleanup = Arc::new(RecordingCleanup::default());
    let server = HttpServer::with_services(config(), Arc::new(FailingFilter), cleanup.clone()).unwrap();
    let (addr, shutdown) = common::start_server(server).await;

    let res = common::client()
        .get(format!("http://{}/filteredimage?image_url=http://{}/a.png", addr, origin))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "There was a problem while filtering the image");
    assert!(body.get("error").is_none());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(cleanup.calls().is_empty(), "nothing was produced, nothing to clean");

    shutdown.trigger();
}

#[tokio::test]
async fn test_cleanup_runs_once_per_request_with_its_own_path() {
    let origin = common::start_image_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let filter = Arc::new(StaticFilter::new(dir.path(), b"\xFF\xD8payload".to_vec()));
    let cleanup = Arc::new(RecordingCleanup::default());
    let server = HttpServer::with_services(config(), filter.clone(), cleanup.clone()).unwrap();
    let (addr, shutdown) = common::start_server(server).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/filteredimage?image_url=http://{}/a.png", addr, origin))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(&res.bytes().await.unwrap()[..], b"\xFF\xD8payload");
    }

    assert!(common::eventually(|| cleanup.calls().len() == 3).await);
    let mut deleted: Vec<PathBuf> = cleanup.calls().into_iter().flatten().collect();
    deleted.sort();
    let expected: Vec<PathBuf> = (0..3).map(|n| dir.path().join(format!("filtered.{}.jpg", n))).collect();
    assert_eq!(deleted, expected);
    assert_eq!(common::file_count(dir.path()), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_abort_still_cleans_up() {
    let origin = common::start_image_origin().await;
    let dir = tempfile::tempdir().unwrap();
    // Big enough that the transfer can't finish before we hang up.
    let filter = Arc::new(StaticFilter::new(dir.path(), vec![0xAB; 16 * 1024 * 1024]));
    let cleanup = Arc::new(RecordingCleanup::default());
    let server = HttpServer::with_services(config(), filter, cleanup.clone()).unwrap();
    let (addr, shutdown) = common::start_server(server).await;

    let res = common::client()
        .get(format!("http://{}/filteredimage?image_url=http://{}/a.png", addr, origin))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    drop(res);

    assert!(common::eventually(|| cleanup.calls().len() == 1).await);
    let output_dir = dir.path().to_path_buf();
    assert!(common::eventually(|| common::file_count(&output_dir) == 0).await);

    shutdown.trigger();
}
