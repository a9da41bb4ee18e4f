use thiserror::Error;

/// BLE transport error.
///
/// Concrete transports fold their platform error into [`Backend`];
/// the engine only dispatches on the coarse shape.
///
/// [`Backend`]: BleError::Backend
#[derive(Debug, Error)]
pub enum BleError {
    /// Operation attempted without an established connection.
    #[error("not connected")]
    NotConnected,

    /// The peripheral's current GATT database does not expose the
    /// requested characteristic. Expected when the device is in the
    /// wrong mode: application and DFU databases differ.
    #[error("characteristic {characteristic} not found")]
    CharacteristicNotFound { characteristic: uuid::Uuid },

    /// The transport's native timeout fired.
    #[error("timed out")]
    Timeout,

    /// Platform stack error, stringly preserved.
    #[error("{0}")]
    Backend(String),
}
