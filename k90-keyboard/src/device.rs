//! Per-interface driver data and the attach/detach lifecycle
//!
//! Every K90 interface gets a [`Device`]. Interface 0 additionally carries
//! the special functions (state, LEDs, profiles, attributes). Setting those
//! up can fail; the interface then stays usable for plain key input.

use std::sync::Arc;

use k90_transport::{CommandChannel, ControlTransport, DeviceId, UsageEvent};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::attributes::Attributes;
use crate::error::KeyboardError;
use crate::events::{EventTranslator, SpecialHandles, Translated};
use crate::host::HostSurfaces;
use crate::keymap::GKeyMap;
use crate::led::{Led, LedId};
use crate::profile::Profile;
use crate::state::{DeviceState, SharedState, StateSnapshot};

/// Everything interface 0 owns beyond key mapping
pub struct SpecialFunctions {
    channel: CommandChannel,
    state: SharedState,
    backlight: Arc<Led>,
    record: Arc<Led>,
    profiles: Vec<Arc<Profile>>,
    attributes: Arc<Attributes>,
}

impl SpecialFunctions {
    /// Read the initial state and register every surface with `host`
    ///
    /// Acquisition order is state, backlight LED, record LED, profiles,
    /// attributes. On failure everything acquired so far is released in
    /// reverse order.
    pub async fn init(
        id: DeviceId,
        channel: CommandChannel,
        host: &dyn HostSurfaces,
    ) -> Result<Self, KeyboardError> {
        let runtime = Handle::try_current()
            .map_err(|e| KeyboardError::InitializationFailed(format!("no async runtime: {}", e)))?;
        let name = id.to_string();

        let reader = channel.clone();
        let (status, mode) =
            tokio::task::spawn_blocking(move || (reader.get_status(), reader.get_mode()))
                .await
                .map_err(|e| {
                    KeyboardError::InitializationFailed(format!("initial state read aborted: {}", e))
                })?;

        let mut state = DeviceState::default();
        let mut backlight_level = 0;
        match status {
            Ok(status) => {
                if status.backlight() > LedId::Backlight.max_brightness() {
                    warn!("{}: K90 reported backlight {}, clamping", name, status.backlight());
                }
                backlight_level = status.backlight();
                state.apply_status(&status);
            }
            Err(e) => warn!("{}: failed to get K90 initial state: {}", name, e),
        }
        match mode {
            Ok(mode) => state.apply_mode(&mode),
            Err(e) => warn!("{}: failed to get K90 initial mode: {}", name, e),
        }
        debug!("{}: initial state {:?}, backlight {}", name, state, backlight_level);
        let state: SharedState = Arc::new(RwLock::new(state));

        let backlight = Arc::new(Led::spawn(
            LedId::Backlight,
            &name,
            backlight_level,
            channel.clone(),
            &runtime,
        ));
        if let Err(e) = host.register_led(&backlight) {
            backlight.shutdown().await;
            return Err(e.into());
        }

        let record = Arc::new(Led::spawn(LedId::Record, &name, 0, channel.clone(), &runtime));
        if let Err(e) = host.register_led(&record) {
            record.shutdown().await;
            release(host, &[], None, &backlight).await;
            return Err(e.into());
        }

        let mut profiles = Vec::with_capacity(3);
        for profile in Profile::all(&name, &channel) {
            let profile = Arc::new(profile);
            if let Err(e) = host.register_profile(&profile) {
                release(host, &profiles, Some(&record), &backlight).await;
                return Err(e.into());
            }
            profiles.push(profile);
        }

        let attributes = Arc::new(Attributes::new(state.clone(), channel.clone()));
        if let Err(e) = host.register_attributes(id, &attributes) {
            release(host, &profiles, Some(&record), &backlight).await;
            return Err(e.into());
        }

        Ok(Self {
            channel,
            state,
            backlight,
            record,
            profiles,
            attributes,
        })
    }

    /// Unregister everything and wait for both LED workers to finish
    pub async fn cleanup(&self, id: DeviceId, host: &dyn HostSurfaces) {
        host.unregister_attributes(id);
        release(host, &self.profiles, Some(&self.record), &self.backlight).await;
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub fn state(&self) -> DeviceState {
        *self.state.read()
    }

    pub fn backlight(&self) -> &Arc<Led> {
        &self.backlight
    }

    pub fn record_led(&self) -> &Arc<Led> {
        &self.record
    }

    pub fn led(&self, id: LedId) -> &Arc<Led> {
        match id {
            LedId::Backlight => &self.backlight,
            LedId::Record => &self.record,
        }
    }

    pub fn profiles(&self) -> &[Arc<Profile>] {
        &self.profiles
    }

    /// Profile slot by number (1..=3)
    pub fn profile(&self, number: u8) -> Option<&Arc<Profile>> {
        self.profiles.iter().find(|p| p.number() == number)
    }

    pub fn attributes(&self) -> &Arc<Attributes> {
        &self.attributes
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let state = self.state();
        StateSnapshot {
            current_profile: state.current_profile,
            macro_mode: state.macro_mode,
            meta_locked: state.meta_locked,
            backlight: self.backlight.brightness(),
            record_led: self.record.brightness(),
        }
    }

    fn handles(&self) -> SpecialHandles {
        SpecialHandles {
            state: self.state.clone(),
            backlight: self.backlight.clone(),
            record: self.record.clone(),
        }
    }
}

/// Release in reverse acquisition order: profiles, record LED, backlight LED
async fn release(
    host: &dyn HostSurfaces,
    profiles: &[Arc<Profile>],
    record: Option<&Arc<Led>>,
    backlight: &Arc<Led>,
) {
    for profile in profiles.iter().rev() {
        host.unregister_profile(profile);
    }
    if let Some(record) = record {
        host.unregister_led(record);
    }
    host.unregister_led(backlight);
    if let Some(record) = record {
        record.shutdown().await;
    }
    backlight.shutdown().await;
}

/// One attached K90 interface
pub struct Device {
    id: DeviceId,
    translator: EventTranslator,
    special: Option<SpecialFunctions>,
}

impl Device {
    /// Attach an interface
    ///
    /// Only interface 0 sets up special functions. A failure there is logged
    /// and the interface is attached for key input only.
    pub async fn attach(
        id: DeviceId,
        transport: Arc<dyn ControlTransport>,
        keymap: GKeyMap,
        host: &dyn HostSurfaces,
    ) -> Device {
        let special = if id.has_special_functions() {
            match SpecialFunctions::init(id, CommandChannel::new(transport), host).await {
                Ok(special) => {
                    info!("{}: K90 special functions ready", id);
                    Some(special)
                }
                Err(e) => {
                    warn!("{}: failed to initialize K90 special functions: {}", id, e);
                    None
                }
            }
        } else {
            None
        };

        let translator = match &special {
            Some(special) => EventTranslator::with_special(keymap, special.handles()),
            None => EventTranslator::new(keymap),
        };

        Device {
            id,
            translator,
            special,
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> String {
        self.id.to_string()
    }

    pub fn special(&self) -> Option<&SpecialFunctions> {
        self.special.as_ref()
    }

    pub fn has_special_functions(&self) -> bool {
        self.special.is_some()
    }

    pub fn handle_event(&self, event: UsageEvent) -> Translated {
        self.translator.translate_event(event)
    }

    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.special.as_ref().map(|s| s.snapshot())
    }

    /// Tear down special functions, if any
    pub async fn detach(&self, host: &dyn HostSurfaces) {
        if let Some(special) = &self.special {
            special.cleanup(self.id, host).await;
        }
        info!("{}: detached", self.id);
    }
}
