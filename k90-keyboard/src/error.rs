//! Keyboard driver error types

use k90_transport::{BlobKind, TransportError};
use thiserror::Error;

/// Errors from keyboard operations
#[derive(Error, Debug)]
pub enum KeyboardError {
    /// Out-of-domain host input, rejected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Bulk write exceeds its bound, rejected before any I/O
    #[error("{kind} payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        kind: BlobKind,
        len: usize,
        max: usize,
    },

    /// The hardware transfer failed; device state was left unchanged
    #[error("Transfer failed: {0}")]
    TransferFailed(TransportError),

    /// Special-function setup failed at attach
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}

impl From<TransportError> for KeyboardError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::PayloadTooLarge { kind, len, max } => {
                KeyboardError::PayloadTooLarge { kind, len, max }
            }
            TransportError::InvalidValue(msg) => KeyboardError::InvalidArgument(msg),
            other => KeyboardError::TransferFailed(other),
        }
    }
}

impl From<crate::host::HostError> for KeyboardError {
    fn from(e: crate::host::HostError) -> Self {
        KeyboardError::InitializationFailed(e.to_string())
    }
}
