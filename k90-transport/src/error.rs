//! Transport error types

use thiserror::Error;

/// libusb error, re-exported for callers that match on transfer failures
pub use rusb::Error as RusbError;

use crate::command::BlobKind;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The control transfer itself failed; the libusb error is kept as-is
    #[error("USB transfer failed: {0}")]
    Usb(#[from] rusb::Error),

    #[error("HID error: {0}")]
    Hid(String),

    #[error("Short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    /// Rejected locally, no transfer was attempted
    #[error("{kind} payload too large: {len} bytes (max {max})")]
    PayloadTooLarge {
        kind: BlobKind,
        len: usize,
        max: usize,
    },

    /// Rejected locally, no transfer was attempted
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl From<hidapi::HidError> for TransportError {
    fn from(e: hidapi::HidError) -> Self {
        TransportError::Hid(e.to_string())
    }
}
