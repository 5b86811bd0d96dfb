//! Host surfaces the driver registers its objects with
//!
//! A host decides how LEDs, profile slots and the attribute group become
//! visible (sysfs-like tree, D-Bus, a CLI). Registration can fail; the
//! driver unwinds whatever it registered before the failure.

use std::sync::Arc;

use k90_transport::DeviceId;
use thiserror::Error;

use crate::attributes::Attributes;
use crate::led::Led;
use crate::profile::Profile;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to register {surface}: {reason}")]
pub struct HostError {
    pub surface: String,
    pub reason: String,
}

impl HostError {
    pub fn new(surface: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            reason: reason.into(),
        }
    }
}

pub trait HostSurfaces: Send + Sync {
    /// Create the device class profile slots live under
    fn register_class(&self, name: &str) -> Result<(), HostError>;
    fn unregister_class(&self, name: &str);

    fn register_led(&self, led: &Arc<Led>) -> Result<(), HostError>;
    fn unregister_led(&self, led: &Arc<Led>);

    fn register_profile(&self, profile: &Arc<Profile>) -> Result<(), HostError>;
    fn unregister_profile(&self, profile: &Arc<Profile>);

    fn register_attributes(&self, device: DeviceId, attributes: &Arc<Attributes>) -> Result<(), HostError>;
    fn unregister_attributes(&self, device: DeviceId);
}
