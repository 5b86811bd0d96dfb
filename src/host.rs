//! Host surfaces for the daemon
//!
//! The daemon has no sysfs tree to publish into, so registration records the
//! surface names and logs them.

use std::sync::Arc;

use k90_keyboard::{Attributes, DeviceId, HostError, HostSurfaces, Led, Profile};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Default)]
pub struct LoggingHost {
    registered: Mutex<Vec<String>>,
}

impl LoggingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names currently registered, in registration order
    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().clone()
    }

    fn add(&self, name: String) -> Result<(), HostError> {
        let mut registered = self.registered.lock();
        if registered.contains(&name) {
            return Err(HostError::new(name, "already registered"));
        }
        debug!("registered {}", name);
        registered.push(name);
        Ok(())
    }

    fn remove(&self, name: &str) {
        self.registered.lock().retain(|n| n != name);
        debug!("unregistered {}", name);
    }
}

impl HostSurfaces for LoggingHost {
    fn register_class(&self, name: &str) -> Result<(), HostError> {
        self.add(format!("class:{}", name))
    }

    fn unregister_class(&self, name: &str) {
        self.remove(&format!("class:{}", name))
    }

    fn register_led(&self, led: &Arc<Led>) -> Result<(), HostError> {
        info!(
            "LED {} (brightness {}/{})",
            led.name(),
            led.brightness(),
            led.max_brightness()
        );
        self.add(led.name().to_string())
    }

    fn unregister_led(&self, led: &Arc<Led>) {
        self.remove(led.name())
    }

    fn register_profile(&self, profile: &Arc<Profile>) -> Result<(), HostError> {
        self.add(profile.name().to_string())
    }

    fn unregister_profile(&self, profile: &Arc<Profile>) {
        self.remove(profile.name())
    }

    fn register_attributes(&self, device: DeviceId, attributes: &Arc<Attributes>) -> Result<(), HostError> {
        info!(
            "{}: macro_mode={} current_profile={}",
            device,
            attributes.macro_mode_show().trim_end(),
            attributes.current_profile_show().trim_end()
        );
        self.add(format!("{}:attributes", device))
    }

    fn unregister_attributes(&self, device: DeviceId) {
        self.remove(&format!("{}:attributes", device))
    }
}
