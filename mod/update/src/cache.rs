use std::path::Path;
use std::sync::Arc;

use geckota_fetch::Fetcher;
use geckota_core::UpdateError;
use md5::{Digest, Md5};
use tracing::{debug, info};

use crate::model::{DownloadedArtifact, FirmwareInfo};

/// C2 — materialise firmware artifacts on local storage.
///
/// Each download lands in a fresh `.gbl` temp file; the path outlives
/// the cache (cleanup is the caller's responsibility). Nothing is
/// deduplicated by URL, and concurrent downloads of different artifacts
/// are permitted.
pub struct ArtifactCache {
    fetcher: Arc<dyn Fetcher>,
    verify_md5: bool,
}

impl ArtifactCache {
    pub fn new(fetcher: Arc<dyn Fetcher>, verify_md5: bool) -> Self {
        Self { fetcher, verify_md5 }
    }

    /// Download `info` and return its local path and stat size.
    pub async fn download(&self, info: &FirmwareInfo) -> Result<DownloadedArtifact, UpdateError> {
        let temp = tempfile::Builder::new()
            .prefix("fw-")
            .suffix(".gbl")
            .tempfile()
            .map_err(|e| UpdateError::Unknown(format!("temp file: {e}")))?;
        let path = temp
            .into_temp_path()
            .keep()
            .map_err(|e| UpdateError::Unknown(format!("temp file: {e}")))?;

        debug!("downloading {} ({}) to {}", info.name, info.url, path.display());
        self.fetcher
            .download(&info.url, &path)
            .await
            .map_err(|e| UpdateError::BundleUnavailable(e.to_string()))?;

        // Byte length as the filesystem sees it, not as the transport
        // counted it.
        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| UpdateError::Unknown(format!("stat: {e}")))?
            .len();

        if self.verify_md5 && !info.md5.is_empty() {
            verify_digest(&path, &info.md5).await?;
        }

        info!("downloaded {} v{}: {} bytes", info.name, info.version, size);
        Ok(DownloadedArtifact {
            info: info.clone(),
            path,
            size,
        })
    }
}

/// Compare the file's MD5 against the hex digest the index advertised.
async fn verify_digest(path: &Path, expected: &str) -> Result<(), UpdateError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| UpdateError::Unknown(format!("read-back: {e}")))?;

    let digest = Md5::digest(&bytes);
    let actual: String = digest.iter().map(|b| format!("{b:02x}")).collect();

    if !actual.eq_ignore_ascii_case(expected) {
        return Err(UpdateError::BundleUnavailable(format!(
            "md5 mismatch: index advertises {expected}, artifact is {actual}"
        )));
    }
    Ok(())
}
