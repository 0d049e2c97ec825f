//! Network and filesystem byte source.
//!
//! [`HttpSource`] is the production [`ByteSource`]: `http://` and
//! `https://` URLs go through a shared `reqwest::Client`, anything else is
//! read as a local path. Both paths enforce the same size cap, so an
//! oversized attachment is refused before it is decoded.

use crate::imaging::{ByteSource, ImagingError, Result};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Connection limits for [`HttpSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_bytes: 8 * 1024 * 1024,
            user_agent: format!("imagebot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpSource {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| ImagingError::Fetch(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImagingError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImagingError::Fetch(format!("{url}: HTTP {}", status.as_u16())));
        }
        if let Some(declared) = response.content_length() {
            check_size(url, declared, self.max_bytes)?;
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImagingError::Fetch(format!("{url}: {e}")))?
        {
            body.extend_from_slice(&chunk);
            check_size(url, body.len() as u64, self.max_bytes)?;
        }
        log::debug!("fetched {url} ({} bytes)", body.len());
        Ok(body)
    }

    async fn fetch_file(&self, path: &str) -> Result<Vec<u8>> {
        let meta = tokio::fs::metadata(Path::new(path))
            .await
            .map_err(|e| ImagingError::Fetch(format!("{path}: {e}")))?;
        check_size(path, meta.len(), self.max_bytes)?;
        tokio::fs::read(path)
            .await
            .map_err(|e| ImagingError::Fetch(format!("{path}: {e}")))
    }
}

impl ByteSource for HttpSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            if is_remote(url) {
                self.fetch_http(url).await
            } else {
                self.fetch_file(url).await
            }
        }
    }
}

fn is_remote(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn check_size(what: &str, size: u64, max_bytes: u64) -> Result<()> {
    if size > max_bytes {
        return Err(ImagingError::Fetch(format!(
            "{what}: {:.2} MB exceeds the {:.2} MB limit",
            size as f64 / 1024.0 / 1024.0,
            max_bytes as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(max_bytes: u64) -> HttpSource {
        HttpSource::new(&FetchSettings {
            max_bytes,
            ..FetchSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn recognises_remote_schemes() {
        assert!(is_remote("https://cdn.example.com/a.png"));
        assert!(is_remote("HTTP://example.com/a.png"));
        assert!(!is_remote("photos/a.png"));
        assert!(!is_remote("/tmp/https.png"));
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert!(check_size("x", 10, 10).is_ok());
        assert!(matches!(check_size("x", 11, 10), Err(ImagingError::Fetch(_))));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert_eq!(source(1024).fetch(&path).await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn refuses_oversized_local_files() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(matches!(source(32).fetch(&path).await, Err(ImagingError::Fetch(_))));
    }

    #[tokio::test]
    async fn missing_local_file_is_a_fetch_error() {
        let result = source(1024).fetch("/definitely/not/here.png").await;
        assert!(matches!(result, Err(ImagingError::Fetch(_))));
    }
}
