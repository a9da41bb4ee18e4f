//! Gecko OTA GATT profile constants.
//!
//! UUIDs are compared as parsed values, so the upper-case convention of
//! one platform family and the lower-case of the other both canonicalise
//! here.

use std::time::Duration;

use uuid::{uuid, Uuid};

/// Gecko OTA service.
pub const OTA_SERVICE: Uuid = uuid!("1d14d6ee-fd63-4fa1-bfa4-8f47b42119f0");

/// OTA Control characteristic: 1 byte, writeable.
pub const OTA_CONTROL: Uuid = uuid!("f7bf3564-fb6d-4e53-88a4-5e37e0326063");

/// OTA Data characteristic: variable length, write-without-response.
pub const OTA_DATA: Uuid = uuid!("984227f3-34fc-4045-a5d0-2c581f81a153");

/// Gecko Bootloader Version characteristic: readable, only present in
/// the DFU-mode GATT database. A successful read confirms DFU state.
pub const BOOTLOADER_VERSION: Uuid = uuid!("25f05c0a-e917-46e9-b2a5-aa2be1245afe");

/// Control word: start upload / request reboot into DFU.
pub const CTL_START: u8 = 0x00;

/// Control word: end of upload.
pub const CTL_DONE: u8 = 0x03;

/// Control word: request the target to disconnect.
pub const CTL_CLOSE: u8 = 0x04;

/// ATT MTU the engine requests on every connect.
pub const MTU_REQUEST: u16 = 245;

/// Window after requesting DFU entry, or after completing an image,
/// before the next connect attempt.
pub const REBOOT_DELAY: Duration = Duration::from_millis(2500);

/// Courtesy delay after each control write. Some peripherals need
/// settling time; part of the protocol contract.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Effective data-write payload for a negotiated MTU: the ATT header and
/// margin cost 8 bytes, floor of 1.
pub fn block_size(mtu: u16) -> usize {
    (mtu.saturating_sub(8)).max(1) as usize
}
