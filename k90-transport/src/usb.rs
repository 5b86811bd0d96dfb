//! USB control transport backed by libusb (rusb)
//!
//! Vendor requests are addressed to the device, not an interface, so the
//! transport never claims an interface and can coexist with the kernel's
//! HID driver on the same keyboard.

use std::time::Duration;

use rusb::{DeviceHandle, Direction, GlobalContext, Recipient, RequestType};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::protocol::{timing, PRODUCT_ID, VENDOR_ID};
use crate::types::DeviceId;
use crate::ControlTransport;

/// Enumerate every interface of every attached K90
pub fn list_devices() -> Result<Vec<DeviceId>, TransportError> {
    let mut found = Vec::new();
    for device in rusb::devices()?.iter() {
        let desc = match device.device_descriptor() {
            Ok(d) => d,
            Err(e) => {
                debug!("skipping device without descriptor: {}", e);
                continue;
            }
        };
        if desc.vendor_id() != VENDOR_ID || desc.product_id() != PRODUCT_ID {
            continue;
        }
        let config = device.active_config_descriptor()?;
        for interface in config.interfaces() {
            found.push(DeviceId::new(
                device.bus_number(),
                device.address(),
                interface.number(),
            ));
        }
    }
    debug!("found {} K90 interfaces", found.len());
    Ok(found)
}

/// Control-transfer transport for one keyboard
pub struct UsbTransport {
    handle: DeviceHandle<GlobalContext>,
    id: DeviceId,
    timeout: Duration,
}

impl UsbTransport {
    /// Open the keyboard that owns interface `id`
    pub fn open(id: DeviceId) -> Result<Self, TransportError> {
        let device = rusb::devices()?
            .iter()
            .find(|d| d.bus_number() == id.bus && d.address() == id.address)
            .ok_or_else(|| TransportError::DeviceNotFound(format!("K90 at {}", id)))?;
        let handle = device.open()?;
        info!("opened K90 control channel at {}", id);
        Ok(Self {
            handle,
            id,
            timeout: Duration::from_millis(timing::CONTROL_TIMEOUT_MS),
        })
    }

    /// Open the first K90 found, addressed through its special interface
    pub fn open_first() -> Result<Self, TransportError> {
        let id = list_devices()?
            .into_iter()
            .find(|id| id.has_special_functions())
            .ok_or_else(|| TransportError::DeviceNotFound("no K90 keyboard attached".into()))?;
        Self::open(id)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }
}

impl ControlTransport for UsbTransport {
    fn control_in(
        &self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
    ) -> Result<usize, TransportError> {
        let request_type = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        Ok(self
            .handle
            .read_control(request_type, request, value, index, buf, self.timeout)?)
    }

    fn control_out(
        &self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), TransportError> {
        let request_type =
            rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        let written = self
            .handle
            .write_control(request_type, request, value, index, data, self.timeout)?;
        if written != data.len() {
            return Err(TransportError::ShortTransfer {
                expected: data.len(),
                actual: written,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // requires hardware
    fn test_open_and_read_status() {
        let transport = UsbTransport::open_first().expect("no K90 attached");
        let channel = crate::CommandChannel::new(std::sync::Arc::new(transport));
        let status = channel.get_status().expect("GET_STATUS failed");
        assert!((1..=3).contains(&status.profile()));
    }
}
