//! In-crate test doubles for the transport seams.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use geckota_ble::{BleClient, BleError};
use geckota_fetch::{FetchError, Fetcher};
use uuid::Uuid;

use crate::profile;

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Canned-response [`Fetcher`]: text bodies and artifact blobs by URL,
/// plus per-URL error statuses.
#[derive(Default)]
pub struct MockFetcher {
    texts: Mutex<HashMap<String, String>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    statuses: Mutex<HashMap<String, u16>>,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_text(&self, url: &str, body: &str) {
        self.texts.lock().unwrap().insert(url.into(), body.into());
    }

    pub fn put_blob(&self, url: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(url.into(), bytes);
    }

    pub fn put_status(&self, url: &str, status: u16) {
        self.statuses.lock().unwrap().insert(url.into(), status);
    }

    fn check_status(&self, url: &str) -> Result<(), FetchError> {
        if let Some(status) = self.statuses.lock().unwrap().get(url) {
            return Err(FetchError::Status {
                status: *status,
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Fetcher for MockFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.check_status(url)?;
        self.texts
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        self.check_status(url)?;
        let bytes = self
            .blobs
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Status {
                status: 404,
                url: url.to_string(),
            })?;
        std::fs::write(dest, &bytes).map_err(|e| FetchError::Io(e.to_string()))?;
        Ok(bytes.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// MockBle
// ---------------------------------------------------------------------------

/// Every GATT interaction the mock saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleEvent {
    Connect,
    Discover,
    RequestMtu,
    ReadBootVersion,
    ControlWrite { word: u8, with_response: bool },
    DataWrite { len: usize },
    Cancel,
}

#[derive(Debug)]
struct MockBleState {
    connected: bool,
    mtu: u16,
    boot_version: Option<Vec<u8>>,
    fail_connects: u32,
    fail_boot_reads: u32,
    fail_control_writes: u32,
    fail_data_writes: u32,
    events: Vec<BleEvent>,
    data: Vec<u8>,
}

/// Scripted [`BleClient`]: records every interaction, returns a
/// configured MTU and bootloader version, and can be told to fail the
/// next N connects, bootloader reads, control writes or data writes.
pub struct MockBle {
    inner: Mutex<MockBleState>,
}

impl MockBle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(MockBleState {
                connected: false,
                mtu: profile::MTU_REQUEST,
                boot_version: Some(vec![2, 0, 0]),
                fail_connects: 0,
                fail_boot_reads: 0,
                fail_control_writes: 0,
                fail_data_writes: 0,
                events: Vec::new(),
                data: Vec::new(),
            }),
        })
    }

    pub fn set_mtu(&self, mtu: u16) {
        self.inner.lock().unwrap().mtu = mtu;
    }

    pub fn fail_next_connects(&self, n: u32) {
        self.inner.lock().unwrap().fail_connects = n;
    }

    pub fn fail_next_boot_reads(&self, n: u32) {
        self.inner.lock().unwrap().fail_boot_reads = n;
    }

    pub fn fail_next_control_writes(&self, n: u32) {
        self.inner.lock().unwrap().fail_control_writes = n;
    }

    pub fn fail_next_data_writes(&self, n: u32) {
        self.inner.lock().unwrap().fail_data_writes = n;
    }

    pub fn events(&self) -> Vec<BleEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn data(&self) -> Vec<u8> {
        self.inner.lock().unwrap().data.clone()
    }

    /// Sizes of the OTA Data writes, in order.
    pub fn data_write_sizes(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BleEvent::DataWrite { len } => Some(len),
                _ => None,
            })
            .collect()
    }

    /// Control words written, in order.
    pub fn control_words(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BleEvent::ControlWrite { word, .. } => Some(word),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl BleClient for MockBle {
    async fn connect(&self, _device: &str, _mtu_hint: u16) -> Result<(), BleError> {
        let mut state = self.inner.lock().unwrap();
        state.events.push(BleEvent::Connect);
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(BleError::Backend("connect refused".into()));
        }
        state.connected = true;
        Ok(())
    }

    async fn discover_services(&self, _device: &str) -> Result<(), BleError> {
        let mut state = self.inner.lock().unwrap();
        state.events.push(BleEvent::Discover);
        if !state.connected {
            return Err(BleError::NotConnected);
        }
        Ok(())
    }

    async fn request_mtu(&self, _device: &str, _mtu: u16) -> Result<u16, BleError> {
        let mut state = self.inner.lock().unwrap();
        state.events.push(BleEvent::RequestMtu);
        if !state.connected {
            return Err(BleError::NotConnected);
        }
        Ok(state.mtu)
    }

    async fn read_characteristic(
        &self,
        _device: &str,
        _service: Uuid,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, BleError> {
        let mut state = self.inner.lock().unwrap();
        if characteristic == profile::BOOTLOADER_VERSION {
            state.events.push(BleEvent::ReadBootVersion);
            if state.fail_boot_reads > 0 {
                state.fail_boot_reads -= 1;
                return Err(BleError::CharacteristicNotFound { characteristic });
            }
            return state
                .boot_version
                .clone()
                .ok_or(BleError::CharacteristicNotFound { characteristic });
        }
        Err(BleError::CharacteristicNotFound { characteristic })
    }

    async fn write_with_response(
        &self,
        _device: &str,
        _service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), BleError> {
        let mut state = self.inner.lock().unwrap();
        if !state.connected {
            return Err(BleError::NotConnected);
        }
        if characteristic == profile::OTA_CONTROL {
            state.events.push(BleEvent::ControlWrite {
                word: value[0],
                with_response: true,
            });
            if state.fail_control_writes > 0 {
                state.fail_control_writes -= 1;
                return Err(BleError::Backend("control write rejected".into()));
            }
        }
        Ok(())
    }

    async fn write_without_response(
        &self,
        _device: &str,
        _service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), BleError> {
        let mut state = self.inner.lock().unwrap();
        if !state.connected {
            return Err(BleError::NotConnected);
        }
        if characteristic == profile::OTA_DATA {
            state.events.push(BleEvent::DataWrite { len: value.len() });
            if state.fail_data_writes > 0 {
                state.fail_data_writes -= 1;
                return Err(BleError::Backend("write dropped".into()));
            }
            state.data.extend_from_slice(value);
        } else if characteristic == profile::OTA_CONTROL {
            state.events.push(BleEvent::ControlWrite {
                word: value[0],
                with_response: false,
            });
            if state.fail_control_writes > 0 {
                state.fail_control_writes -= 1;
                return Err(BleError::Backend("control write rejected".into()));
            }
        }
        Ok(())
    }

    async fn is_connected(&self, _device: &str) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn cancel_connection(&self, _device: &str) -> Result<(), BleError> {
        let mut state = self.inner.lock().unwrap();
        state.events.push(BleEvent::Cancel);
        state.connected = false;
        Ok(())
    }
}
