use std::sync::Arc;

use geckota_ble::{BleClient, BleError};
use geckota_core::{ProgressFn, UpdateError};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::profile::{
    block_size, BOOTLOADER_VERSION, CTL_CLOSE, CTL_DONE, CTL_START, MTU_REQUEST, OTA_CONTROL,
    OTA_DATA, OTA_SERVICE, REBOOT_DELAY, SETTLE_DELAY,
};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Protocol engine state for one image.
///
/// ```text
/// Idle → Connecting → Connected → ConfirmDfu ─────────┐
///                         │            │ (read ok)    │ (read failed)
///                         │            ▼              ▼
///                         └──────→ RebootingToDfu → Reconnecting
///                                      (skip_reboot = false)
///                                                     │
///                              Ready ←────────────────┘
///                                │
///                           Uploading → Finalising → Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    ConfirmDfu,
    RebootingToDfu,
    Reconnecting,
    Ready,
    Uploading,
    Finalising,
    Done,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::ConfirmDfu => "CONFIRM_DFU",
            Self::RebootingToDfu => "REBOOTING_TO_DFU",
            Self::Reconnecting => "RECONNECTING",
            Self::Ready => "READY",
            Self::Uploading => "UPLOADING",
            Self::Finalising => "FINALISING",
            Self::Done => "DONE",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OtaSession
// ---------------------------------------------------------------------------

/// C3 — drives one peripheral through the Gecko OTA bootloader protocol
/// for a single image.
///
/// Exactly one session is active per peripheral at a time; the engine
/// assumes exclusive ownership of the link. All fixed delays here are
/// part of the protocol contract, not tuning knobs.
pub struct OtaSession {
    ble: Arc<dyn BleClient>,
    device: String,
    cancel: CancellationToken,
    on_progress: ProgressFn,
    state: SessionState,
    block_size: usize,
}

impl OtaSession {
    pub fn new(
        ble: Arc<dyn BleClient>,
        device: impl Into<String>,
        cancel: CancellationToken,
        on_progress: ProgressFn,
    ) -> Self {
        Self {
            ble,
            device: device.into(),
            cancel,
            on_progress,
            state: SessionState::Idle,
            block_size: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Apply one image. Returns the number of bytes written, which must
    /// equal the image length for the image to count as applied.
    ///
    /// `skip_reboot` asserts the device is already in DFU mode (second
    /// part of a multi-part update, or caller knows the device rebooted
    /// into the bootloader). The assertion is verified by reading the
    /// bootloader version; when the read fails the session falls back to
    /// the reboot path.
    pub async fn flash(&mut self, image: &[u8], skip_reboot: bool) -> Result<u64, UpdateError> {
        self.ensure_live().await?;

        self.set_state(SessionState::Connecting);
        self.connect().await?;
        self.set_state(SessionState::Connected);

        let mut in_dfu = false;
        if skip_reboot {
            self.set_state(SessionState::ConfirmDfu);
            in_dfu = self.read_bootloader_version().await.is_some();
            if !in_dfu {
                warn!("expected DFU mode but bootloader version unreadable, rebooting");
            }
        }
        if !in_dfu {
            self.reboot_into_dfu().await?;
        }
        self.set_state(SessionState::Ready);

        self.ensure_live().await?;
        let written = self.upload(image).await?;

        self.set_state(SessionState::Finalising);
        self.finalise().await;

        if written != image.len() as u64 {
            return Err(UpdateError::WriteFailed(format!(
                "wrote {written} of {} bytes",
                image.len()
            )));
        }
        self.set_state(SessionState::Done);
        info!("image applied: {written} bytes");
        Ok(written)
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Tear down whatever came before, connect with the MTU hint, run
    /// full discovery and read back the negotiated MTU.
    ///
    /// Discovery must run on every reconnect: DFU mode and application
    /// mode expose different GATT databases on the same address.
    async fn connect(&mut self) -> Result<(), UpdateError> {
        if let Err(e) = self.ble.cancel_connection(&self.device).await {
            trace!("pre-connect teardown: {e}");
        }
        sleep(SETTLE_DELAY).await;

        self.ble
            .connect(&self.device, MTU_REQUEST)
            .await
            .map_err(|e| UpdateError::ConnectFailed(format!("connect: {e}")))?;
        self.ble
            .discover_services(&self.device)
            .await
            .map_err(|e| UpdateError::ConnectFailed(format!("discovery: {e}")))?;
        let mtu = self
            .ble
            .request_mtu(&self.device, MTU_REQUEST)
            .await
            .map_err(|e| UpdateError::ConnectFailed(format!("mtu exchange: {e}")))?;

        self.block_size = block_size(mtu);
        debug!("connected to {}, mtu {mtu}, block size {}", self.device, self.block_size);
        Ok(())
    }

    /// Read the Gecko Bootloader Version characteristic. Readable only
    /// in the DFU-mode GATT database, so a successful read confirms DFU
    /// state.
    async fn read_bootloader_version(&self) -> Option<Vec<u8>> {
        match self
            .ble
            .read_characteristic(&self.device, OTA_SERVICE, BOOTLOADER_VERSION)
            .await
        {
            Ok(version) => {
                debug!("bootloader version {version:02x?}");
                Some(version)
            }
            Err(e) => {
                debug!("bootloader version read failed: {e}");
                None
            }
        }
    }

    /// Request reboot into DFU, drop the link, wait out the reboot
    /// window, then reconnect and confirm the bootloader answered.
    async fn reboot_into_dfu(&mut self) -> Result<(), UpdateError> {
        self.set_state(SessionState::RebootingToDfu);
        info!("requesting reboot into DFU");

        self.write_control(CTL_START, true)
            .await
            .map_err(|e| UpdateError::RebootFailed(format!("dfu request: {e}")))?;
        sleep(SETTLE_DELAY).await;

        if let Err(e) = self.ble.cancel_connection(&self.device).await {
            debug!("post-reboot-request disconnect: {e}");
        }
        sleep(REBOOT_DELAY).await;

        self.ensure_live().await?;
        self.set_state(SessionState::Reconnecting);
        self.connect().await?;
        if self.read_bootloader_version().await.is_none() {
            return Err(UpdateError::ConnectFailed(
                "device did not re-enter DFU mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Arm the bootloader, then stream the image in `block_size` slices.
    ///
    /// Data writes are write-without-response, but each is issued only
    /// after the previous one completed: byte order on the wire is
    /// load-bearing.
    async fn upload(&mut self, image: &[u8]) -> Result<u64, UpdateError> {
        self.set_state(SessionState::Uploading);

        self.write_control(CTL_START, true)
            .await
            .map_err(|e| UpdateError::WriteFailed(format!("arm: {e}")))?;
        sleep(SETTLE_DELAY).await;

        let total = image.len() as u64;
        let mut written: u64 = 0;
        (self.on_progress)(0.0);

        for chunk in image.chunks(self.block_size) {
            self.ensure_live().await?;
            self.ble
                .write_without_response(&self.device, OTA_SERVICE, OTA_DATA, chunk)
                .await
                .map_err(|e| UpdateError::WriteFailed(format!("data write at {written}: {e}")))?;
            written += chunk.len() as u64;
            (self.on_progress)(written as f64 / total as f64);
            trace!("uploaded {written}/{total}");
        }
        if total == 0 {
            (self.on_progress)(1.0);
        }
        Ok(written)
    }

    /// Termination handshake. Failures here are logged and non-fatal:
    /// the image counts as applied if the byte count matched, and the
    /// target is expected to drop the link on `CTL_CLOSE` anyway.
    async fn finalise(&mut self) {
        sleep(SETTLE_DELAY).await;

        if let Err(e) = self.write_control(CTL_DONE, true).await {
            warn!("end-of-upload write failed: {e}");
        }
        sleep(SETTLE_DELAY).await;

        if let Err(e) = self.write_control(CTL_CLOSE, false).await {
            warn!("close request failed: {e}");
        }
        sleep(SETTLE_DELAY).await;

        // Some peripherals do not close reliably.
        if let Err(e) = self.ble.cancel_connection(&self.device).await {
            debug!("defensive disconnect: {e}");
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn write_control(&self, word: u8, with_response: bool) -> Result<(), BleError> {
        trace!("control write {word:#04x} (response={with_response})");
        let payload = [word];
        if with_response {
            self.ble
                .write_with_response(&self.device, OTA_SERVICE, OTA_CONTROL, &payload)
                .await
        } else {
            self.ble
                .write_without_response(&self.device, OTA_SERVICE, OTA_CONTROL, &payload)
                .await
        }
    }

    /// Cooperative cancellation point. Advisory: a blocking native GATT
    /// call is not interrupted, but no further protocol step starts once
    /// the flag is seen.
    async fn ensure_live(&self) -> Result<(), UpdateError> {
        if self.cancel.is_cancelled() {
            warn!("session cancelled, tearing down");
            let _ = self.ble.cancel_connection(&self.device).await;
            return Err(UpdateError::Cancelled);
        }
        Ok(())
    }

    fn set_state(&mut self, next: SessionState) {
        trace!("session {} -> {next}", self.state);
        self.state = next;
    }
}
