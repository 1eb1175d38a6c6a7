//! Existence probe: a single HEAD request, collapsed to a boolean.
//!
//! Timeout, DNS failure, refused connection, TLS error and non-2xx status
//! all become `false`. Only a debug log keeps the detail.

/// Issues HEAD requests against candidate image URLs.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// One attempt, no retry. Latency is bounded only by the client's timeout.
    pub async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    tracing::debug!(url = %url, status = %status, "Probe failed: non-success status");
                }
                status.is_success()
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Probe failed: request error");
                false
            }
        }
    }
}
