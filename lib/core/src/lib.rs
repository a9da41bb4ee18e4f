//! Shared foundation for the geckota OTA engine: the stable error
//! taxonomy, run outcomes, caller callbacks and session configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ApplyOrder, EngineConfig, DEFAULT_BASE_URL, DEFAULT_CHANNEL};
pub use error::{error_code, UpdateError};
pub use types::{noop_progress, noop_status, Outcome, ProgressFn, StatusFn};
