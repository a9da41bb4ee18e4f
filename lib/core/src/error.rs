use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these —
// never on the human-readable message string.

/// Stable numeric error codes, surface-compatible with the historical
/// integer bands carried by the mobile clients.
///
/// Codes never change; messages may be reworded.
pub mod error_code {
    /// Transport failure or non-2xx status retrieving the firmware index.
    pub const INDEX_UNAVAILABLE: i32 = -1000;
    /// Index body is not JSON or has the wrong shape.
    pub const INDEX_MALFORMED: i32 = -1001;
    /// Model token absent from the index.
    pub const DEVICE_UNKNOWN: i32 = -1002;
    /// Cannot determine the latest version (no `latest` and not exactly
    /// one version key).
    pub const LATEST_UNKNOWN: i32 = -1100;
    /// Transport failure downloading a specific artifact.
    pub const BUNDLE_UNAVAILABLE: i32 = -2000;
    /// Any other failure surfaced from transports or the engine.
    pub const UNKNOWN_ERROR: i32 = -9999;
}

// ── UpdateError ─────────────────────────────────────────────────────

/// Unified error type used across the OTA engine.
///
/// Each variant maps to a stable numeric code (see [`error_code`]).
/// Protocol-phase failures (connect, reboot, write) have no dedicated
/// band and report [`error_code::UNKNOWN_ERROR`]; the variant itself is
/// what the orchestrator's retry policy dispatches on.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Could not retrieve the firmware index.
    #[error("{0}")]
    IndexUnavailable(String),

    /// Index retrieved but not parseable as the expected JSON shape.
    #[error("{0}")]
    IndexMalformed(String),

    /// Device model not present in the index.
    #[error("{0}")]
    DeviceUnknown(String),

    /// No `latest` entry and more than one candidate version.
    #[error("{0}")]
    LatestUnknown(String),

    /// Could not download a firmware artifact.
    #[error("{0}")]
    BundleUnavailable(String),

    /// Connect, service discovery or reconnect failed.
    #[error("{0}")]
    ConnectFailed(String),

    /// The DFU reboot request did not go through.
    #[error("{0}")]
    RebootFailed(String),

    /// A control or data write failed mid-upload.
    #[error("{0}")]
    WriteFailed(String),

    /// The session was cancelled by the caller.
    #[error("update cancelled")]
    Cancelled,

    /// Unexpected internal error.
    #[error("{0}")]
    Unknown(String),
}

impl UpdateError {
    /// Stable numeric error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            UpdateError::IndexUnavailable(_) => error_code::INDEX_UNAVAILABLE,
            UpdateError::IndexMalformed(_) => error_code::INDEX_MALFORMED,
            UpdateError::DeviceUnknown(_) => error_code::DEVICE_UNKNOWN,
            UpdateError::LatestUnknown(_) => error_code::LATEST_UNKNOWN,
            UpdateError::BundleUnavailable(_) => error_code::BUNDLE_UNAVAILABLE,
            UpdateError::ConnectFailed(_)
            | UpdateError::RebootFailed(_)
            | UpdateError::WriteFailed(_)
            | UpdateError::Cancelled
            | UpdateError::Unknown(_) => error_code::UNKNOWN_ERROR,
        }
    }

    /// Whether the orchestrator may retry the current image after this
    /// error. Resolver and download errors are final; protocol-phase
    /// errors get exactly one more attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpdateError::ConnectFailed(_)
                | UpdateError::RebootFailed(_)
                | UpdateError::WriteFailed(_)
        )
    }
}
