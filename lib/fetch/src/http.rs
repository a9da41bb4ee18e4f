use std::path::Path;

use reqwest::header::{HeaderValue, CACHE_CONTROL};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::FetchError;
use crate::traits::Fetcher;

/// Default reqwest-backed [`Fetcher`].
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Issue the GET and map a non-2xx status to [`FetchError::Status`].
    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let resp = self
            .http
            .get(url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.get_checked(url).await?;
        Ok(resp.text().await?)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let mut resp = self.get_checked(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::Io(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        debug!("downloaded {} bytes from {} to {}", written, url, dest.display());
        Ok(written)
    }
}
