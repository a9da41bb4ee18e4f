use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Final disposition of an update run.
///
/// The numeric codes are the historical return values of the mobile
/// clients and are part of the caller-facing contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// All images applied and byte counts matched.
    Success,
    /// An image failed twice, or the plan could not be resolved/downloaded.
    Failure,
    /// Device already runs the latest version; nothing to do.
    NoUpdate,
}

impl Outcome {
    /// Caller-facing return code: 1 success, 0 failure, -1 no update.
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => 1,
            Self::Failure => 0,
            Self::NoUpdate => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::NoUpdate => "NO_UPDATE",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Progress callback. Receives a ratio in `[0, 1]`, monotonic within one
/// image; restarts at 0 for each image of a multi-part update.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Status callback. Receives a human-readable message; callers should
/// treat the string as opaque.
pub type StatusFn = Arc<dyn Fn(&str) + Send + Sync>;

/// A progress callback that drops every report.
pub fn noop_progress() -> ProgressFn {
    Arc::new(|_| {})
}

/// A status callback that drops every message.
pub fn noop_status() -> StatusFn {
    Arc::new(|_| {})
}
