//! Process-wide table of attached keyboards
//!
//! Created explicitly at startup and torn down with [`DriverRegistry::shutdown`].
//! The registry owns the profile device class for its whole lifetime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use k90_transport::{ControlTransport, DeviceId, UsageEvent};
use parking_lot::Mutex;
use tracing::info;

use crate::device::Device;
use crate::error::KeyboardError;
use crate::events::Translated;
use crate::host::HostSurfaces;
use crate::keymap::GKeyMap;
use crate::profile::PROFILE_CLASS;

pub struct DriverRegistry {
    host: Arc<dyn HostSurfaces>,
    keymap: GKeyMap,
    devices: Mutex<HashMap<DeviceId, Arc<Device>>>,
    /// Ids with a probe in flight; locked after `devices`
    attaching: Mutex<HashSet<DeviceId>>,
}

/// Holds an id in `attaching` until dropped
struct Reservation<'a> {
    attaching: &'a Mutex<HashSet<DeviceId>>,
    id: DeviceId,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.attaching.lock().remove(&self.id);
    }
}

impl DriverRegistry {
    /// Register the profile class; fails if the host refuses it
    pub fn new(host: Arc<dyn HostSurfaces>, keymap: GKeyMap) -> Result<Self, KeyboardError> {
        host.register_class(PROFILE_CLASS)?;
        Ok(Self {
            host,
            keymap,
            devices: Mutex::new(HashMap::new()),
            attaching: Mutex::new(HashSet::new()),
        })
    }

    pub fn keymap(&self) -> &GKeyMap {
        &self.keymap
    }

    /// Attach one interface
    ///
    /// The id is reserved before attaching, so a concurrent probe of the same
    /// interface fails instead of attaching twice.
    pub async fn probe(
        &self,
        id: DeviceId,
        transport: Arc<dyn ControlTransport>,
    ) -> Result<Arc<Device>, KeyboardError> {
        let reservation = self.reserve(id)?;
        let device = Device::attach(id, transport, self.keymap.clone(), self.host.as_ref()).await;
        let device = Arc::new(device);
        {
            let mut devices = self.devices.lock();
            devices.insert(id, device.clone());
            drop(reservation);
        }
        info!(
            "{}: attached (special functions: {})",
            id,
            device.has_special_functions()
        );
        Ok(device)
    }

    fn reserve(&self, id: DeviceId) -> Result<Reservation<'_>, KeyboardError> {
        let devices = self.devices.lock();
        let mut attaching = self.attaching.lock();
        if devices.contains_key(&id) || !attaching.insert(id) {
            return Err(KeyboardError::InvalidArgument(format!(
                "{} is already attached",
                id
            )));
        }
        Ok(Reservation {
            attaching: &self.attaching,
            id,
        })
    }

    /// Detach one interface; returns false if it was not attached
    pub async fn remove(&self, id: DeviceId) -> bool {
        let device = self.devices.lock().remove(&id);
        match device {
            Some(device) => {
                device.detach(self.host.as_ref()).await;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.lock().get(&id).cloned()
    }

    /// Attached interfaces, sorted
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.devices.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Route a decoded event to its interface
    pub fn dispatch(&self, id: DeviceId, event: UsageEvent) -> Option<Translated> {
        self.get(id).map(|device| device.handle_event(event))
    }

    /// Detach every interface, then drop the profile class
    pub async fn shutdown(self) {
        let devices: Vec<Arc<Device>> = self.devices.lock().drain().map(|(_, d)| d).collect();
        let host = self.host.as_ref();
        join_all(devices.iter().map(|d| d.detach(host))).await;
        self.host.unregister_class(PROFILE_CLASS);
        info!("driver registry shut down");
    }
}
