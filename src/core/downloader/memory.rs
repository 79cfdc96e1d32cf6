use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::ByteFetcher;

/// In-memory `ByteFetcher` serving a fixed URL → body table.
///
/// Unknown URLs yield an empty buffer, like a 404 from `HttpFetcher`.
/// Every requested URL is recorded in order.
#[derive(Default)]
pub struct MemoryFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.insert(url.into(), body.into());
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }
}

#[async_trait]
impl ByteFetcher for MemoryFetcher {
    async fn fetch_bytes(&self, url: &str) -> Vec<u8> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());
        self.bodies.get(url).cloned().unwrap_or_default()
    }
}
