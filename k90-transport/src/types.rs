//! Common types for transport layer

use std::fmt;

/// Identity of one USB interface of an attached keyboard
///
/// The K90 exposes several interfaces; each is probed on its own and only
/// [`crate::protocol::SPECIAL_INTERFACE`] carries the special functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId {
    /// USB bus number
    pub bus: u8,
    /// Device address on the bus
    pub address: u8,
    /// Interface number
    pub interface: u8,
}

impl DeviceId {
    pub fn new(bus: u8, address: u8, interface: u8) -> Self {
        Self {
            bus,
            address,
            interface,
        }
    }

    /// Whether this interface carries G-keys, M-keys and the LEDs
    pub fn has_special_functions(&self) -> bool {
        self.interface == crate::protocol::SPECIAL_INTERFACE
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}-{:03}.{}", self.bus, self.address, self.interface)
    }
}

/// A decoded key transition from an input report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageEvent {
    /// Full HID usage (`page << 16 | id`)
    pub usage: u32,
    /// 1 = press, 0 = release
    pub value: i32,
}

impl UsageEvent {
    pub fn press(usage: u32) -> Self {
        Self { usage, value: 1 }
    }

    pub fn release(usage: u32) -> Self {
        Self { usage, value: 0 }
    }

    /// Usage id within its page
    pub fn usage_id(&self) -> u16 {
        (self.usage & crate::protocol::usage::ID_MASK) as u16
    }
}
