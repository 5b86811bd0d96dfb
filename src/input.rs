//! Virtual keyboard for G-key events using evdev/uinput
//!
//! The kernel keeps delivering ordinary keys from the K90 itself; this device
//! only carries the codes mapped to G-keys.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key,
};
use k90_keyboard::GKeyMap;
use thiserror::Error;

/// Errors from virtual keyboard operations
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] std::io::Error),
    #[error("Failed to emit event: {0}")]
    EmitEvent(#[source] std::io::Error),
}

pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Create the device with every code in `keymap` enabled
    pub fn new(name: &str, keymap: &GKeyMap) -> Result<Self, InputError> {
        let mut keys = AttributeSet::<Key>::new();
        for &code in keymap.codes() {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(InputError::CreateDevice)?
            .name(name)
            .with_keys(&keys)
            .map_err(InputError::CreateDevice)?
            .build()
            .map_err(InputError::CreateDevice)?;

        Ok(Self { device })
    }

    /// Emit one key transition (SYN_REPORT is appended by evdev)
    pub fn emit_key(&mut self, code: u16, value: i32) -> Result<(), InputError> {
        let event = InputEvent::new_now(EventType::KEY, code, value);
        self.device.emit(&[event]).map_err(InputError::EmitEvent)
    }
}
