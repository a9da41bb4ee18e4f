use thiserror::Error;

/// Fetch-layer error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered outside the 2xx range.
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    /// Connection, TLS or protocol failure.
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// Local write failure while streaming a response body to disk.
    #[error("io: {0}")]
    Io(String),
}
