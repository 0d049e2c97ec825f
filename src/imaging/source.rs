//! Where image bytes come from.
//!
//! The pipeline never talks to the network itself; it asks a [`ByteSource`]
//! for the bytes behind a URL. The binary plugs in the reqwest-backed
//! `HttpSource`, tests plug in [`MemorySource`].

use super::error::{ImagingError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

/// Resolves a URL to raw, still-encoded image bytes.
pub trait ByteSource: Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Serves preloaded bytes keyed by URL and records every request.
///
/// Unknown URLs fail with [`ImagingError::Fetch`], like an HTTP 404 would.
/// Uses Mutex so it stays `Sync` when shared with rayon workers.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(url.into(), bytes);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn lookup(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(url.to_string());
        }
        self.entries
            .get(url)
            .cloned()
            .ok_or_else(|| ImagingError::Fetch(format!("{url}: not found")))
    }
}

impl ByteSource for MemorySource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        let result = self.lookup(url);
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_known_urls_and_records_requests() {
        let source = MemorySource::new().with("mem://a", vec![1, 2, 3]);
        assert_eq!(source.fetch("mem://a").await.unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            source.fetch("mem://missing").await,
            Err(ImagingError::Fetch(_))
        ));
        assert_eq!(source.requests(), vec!["mem://a", "mem://missing"]);
    }
}
