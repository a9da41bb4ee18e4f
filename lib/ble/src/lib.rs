//! BLE GATT client seam for the geckota OTA engine.
//!
//! Ships only the [`BleClient`] capability trait and its error type.
//! Concrete radios (btleplug, platform bridges) live in the host
//! application and are injected at session construction.

pub mod error;
pub mod traits;

pub use error::BleError;
pub use traits::BleClient;
