use uuid::Uuid;

use crate::error::BleError;

/// Narrow GATT capability the OTA engine drives a peripheral through.
///
/// One implementation addresses one adapter; every call names the target
/// peripheral by its platform identifier. The engine assumes exclusive
/// ownership of the peripheral for the duration of a session; no other
/// consumer may issue GATT operations concurrently.
///
/// Characteristic addressing is by parsed [`Uuid`], so the upper/lower
/// case conventions of the platform families never reach comparison
/// logic.
#[async_trait::async_trait]
pub trait BleClient: Send + Sync {
    /// Connect to the peripheral, hinting the desired ATT MTU where the
    /// platform supports it at connect time.
    async fn connect(&self, device: &str, mtu_hint: u16) -> Result<(), BleError>;

    /// Perform full service and characteristic discovery. Must be called
    /// after every connect: DFU mode and application mode expose
    /// different GATT databases on the same address.
    async fn discover_services(&self, device: &str) -> Result<(), BleError>;

    /// Request an ATT MTU and return the negotiated value.
    async fn request_mtu(&self, device: &str, mtu: u16) -> Result<u16, BleError>;

    /// Read a characteristic value.
    async fn read_characteristic(
        &self,
        device: &str,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, BleError>;

    /// Write with response (ATT Write Request).
    async fn write_with_response(
        &self,
        device: &str,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), BleError>;

    /// Write without response (ATT Write Command). Completion of the
    /// future means the write was handed to the controller; the engine
    /// relies on this to keep data writes in strict byte order.
    async fn write_without_response(
        &self,
        device: &str,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<(), BleError>;

    /// Whether a connection to the peripheral is currently established.
    async fn is_connected(&self, device: &str) -> bool;

    /// Tear down the connection. Implementations treat "not connected"
    /// as success.
    async fn cancel_connection(&self, device: &str) -> Result<(), BleError>;
}
