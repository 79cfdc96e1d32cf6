use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Transport seam: fetch the full body behind `url`.
///
/// An empty buffer means the fetch failed. Callers cannot tell a 404 from a
/// dropped connection, and zero-length bodies are treated as missing.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Vec<u8>;
}

/// `ByteFetcher` backed by a `reqwest::Client`. One attempt per call, no retry.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Vec<u8> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Request to {} failed: {}", url, e);
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("GET {} returned HTTP {}", url, status.as_u16());
            return Vec::new();
        }

        match response.bytes().await {
            Ok(bytes) => {
                debug!("Fetched {} bytes from {}", bytes.len(), url);
                bytes.to_vec()
            }
            Err(e) => {
                warn!("Reading body of {} failed: {}", url, e);
                Vec::new()
            }
        }
    }
}
