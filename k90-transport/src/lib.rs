//! Transport layer for the Corsair Vengeance K90
//!
//! The keyboard's special functions (backlight, macro mode, record LED,
//! on-device profiles) are driven through vendor control transfers on the
//! default control pipe. Key input arrives as ordinary HID array reports.
//!
//! - [`ControlTransport`]: the raw control-transfer seam
//! - [`CommandChannel`]: typed, validated requests on top of it
//! - [`UsbTransport`]: libusb implementation
//! - [`ReportDecoder`] / [`ReportReader`]: input report decoding

pub mod command;
pub mod error;
pub mod event_parser;
pub mod protocol;
pub mod types;
pub mod usb;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use command::{BlobKind, CommandChannel, MacroMode, ModeReport, StatusReport};
pub use error::{RusbError, TransportError};
pub use event_parser::{open_input, ReportDecoder, ReportLayout, ReportReader};
pub use types::{DeviceId, UsageEvent};
pub use usb::{list_devices, UsbTransport};

/// Raw vendor control transfers to the keyboard
///
/// Both directions use `bmRequestType` = vendor | device recipient and block
/// until the transfer completes or times out.
pub trait ControlTransport: Send + Sync {
    /// Device-to-host transfer into `buf`; returns the number of bytes received
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError>;

    /// Host-to-device transfer of `data` (may be empty)
    fn control_out(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), TransportError>;
}
