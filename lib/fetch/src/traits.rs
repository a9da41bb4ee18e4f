use std::path::Path;

use crate::error::FetchError;

/// Narrow HTTP capability the engine depends on: GET with a no-store
/// hint, either buffered into a string or streamed to a local file.
///
/// The default implementation ([`HttpFetcher`](crate::HttpFetcher)) is
/// reqwest-backed; hosts with their own network stack inject theirs.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body as text. Sends `Cache-Control:
    /// no-store`; the firmware index changes frequently and must never
    /// be served stale by an intermediary.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET `url` and stream the response body to `dest`. Returns the
    /// number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}
