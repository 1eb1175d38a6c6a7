//! Default filter: download, resize, greyscale, JPEG.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use uuid::Uuid;

use crate::config::FilterConfig;
use crate::filter::{FilterError, FilterService, FilteredArtifact};

/// Transform parameters, split from [`FilterConfig`] so they can move into
/// a blocking task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub grayscale: bool,
}

impl From<&FilterConfig> for FilterSettings {
    fn from(config: &FilterConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            jpeg_quality: config.jpeg_quality,
            grayscale: config.grayscale,
        }
    }
}

/// Decode `source`, apply the filter, and return JPEG bytes.
///
/// CPU bound; call from `spawn_blocking` in async code.
pub fn apply_filter(source: &[u8], settings: &FilterSettings) -> Result<Vec<u8>, FilterError> {
    let decoded = image::load_from_memory(source)?;
    let resized = decoded.resize_exact(settings.width, settings.height, FilterType::Triangle);

    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality);
        if settings.grayscale {
            encoder.encode_image(&resized.to_luma8())?;
        } else {
            encoder.encode_image(&resized.to_rgb8())?;
        }
    }
    Ok(out)
}

/// [`FilterService`] backed by an HTTP download and the `image` crate.
pub struct ImageFilter {
    client: reqwest::Client,
    output_dir: PathBuf,
    settings: FilterSettings,
    max_source_bytes: u64,
}

impl ImageFilter {
    pub fn new(client: reqwest::Client, config: &FilterConfig) -> Self {
        Self {
            client,
            output_dir: config.output_dir.clone(),
            settings: FilterSettings::from(config),
            max_source_bytes: config.max_source_bytes,
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FilterError> {
        let limit = self.max_source_bytes;
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(size) = response.content_length() {
            if size > limit {
                return Err(FilterError::TooLarge { size, limit });
            }
        }

        // Content-Length can be absent or wrong, so enforce the cap while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            let size = body.len() as u64;
            if size > limit {
                return Err(FilterError::TooLarge { size, limit });
            }
        }
        Ok(body)
    }

    /// Unique per call so concurrent requests for one URL never share a file.
    fn artifact_path(&self) -> PathBuf {
        artifact_file_name(&self.output_dir)
    }
}

/// An output file nobody has claimed yet. Removed on drop unless kept.
///
/// Returned from the blocking write task: if the awaiting request is gone
/// by the time the write finishes, tokio drops the task output and the file
/// goes with it.
struct PendingArtifact {
    path: PathBuf,
    armed: bool,
}

impl PendingArtifact {
    fn keep(mut self) -> FilteredArtifact {
        self.armed = false;
        FilteredArtifact::new(std::mem::take(&mut self.path))
    }
}

impl Drop for PendingArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Unclaimed artifact removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove unclaimed artifact"
            ),
        }
    }
}

/// Write `bytes` to `path`, creating the parent directory as needed.
///
/// The file is armed for removal before the first byte is written, so a
/// failed write leaves nothing behind.
fn write_artifact(path: PathBuf, bytes: &[u8]) -> Result<PendingArtifact, FilterError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let pending = PendingArtifact { path, armed: true };
    std::fs::write(&pending.path, bytes)?;
    Ok(pending)
}

fn artifact_file_name(dir: &Path) -> PathBuf {
    dir.join(format!("filtered.{}.jpg", Uuid::new_v4()))
}

#[async_trait]
impl FilterService for ImageFilter {
    async fn filter_image(&self, url: &str) -> Result<FilteredArtifact, FilterError> {
        let source = self.download(url).await?;
        tracing::debug!(url = %url, bytes = source.len(), "Source image downloaded");

        let settings = self.settings;
        let path = self.artifact_path();
        let pending = tokio::task::spawn_blocking(move || {
            let encoded = apply_filter(&source, &settings)?;
            write_artifact(path, &encoded)
        })
        .await??;

        tracing::debug!(path = %pending.path.display(), "Artifact written");
        Ok(pending.keep())
    }
}
