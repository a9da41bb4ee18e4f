//! Client-side OTA update engine for IoT devices speaking the Gecko
//! bootloader GATT profile.
//!
//! Given a device identifier and where firmware is published, the
//! engine resolves the latest applicable artifacts, materialises them
//! on local storage, drives the peripheral through its bootloader
//! protocol, and streams each image block-by-block until installed,
//! reporting progress and final disposition to the caller.
//!
//! Transports are injected: HTTP through [`geckota_fetch::Fetcher`],
//! BLE through [`geckota_ble::BleClient`]. The engine owns the
//! peripheral exclusively for the duration of a session.

pub mod api;
pub mod cache;
pub mod model;
pub mod orchestrator;
pub mod profile;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::{download_fw, get_latest_fw_info, start_dfu, DfuRequest};
pub use cache::ArtifactCache;
pub use model::{DeviceFirmware, DownloadedArtifact, FirmwareIndex, FirmwareInfo, UpdatePlan};
pub use orchestrator::{Orchestrator, UpdateParams};
pub use resolver::Resolver;
pub use session::{OtaSession, SessionState};

pub use geckota_core::{
    error_code, ApplyOrder, EngineConfig, Outcome, ProgressFn, StatusFn, UpdateError,
};
