//! Event translation
//!
//! Maps decoded usages to host key events and applies the special range to
//! the device state. Reports are handled one at a time per device. The
//! translator never talks to the keyboard itself: record LED changes go
//! through the LED worker, backlight changes are already applied by the
//! keyboard and only update the cache.

use std::sync::Arc;

use k90_transport::protocol::usage;
use k90_transport::UsageEvent;
use tracing::debug;

use crate::keymap::{map_usage, GKeyMap, UsageClass};
use crate::led::Led;
use crate::state::SharedState;

/// What the host should do with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translated {
    /// Emit this key code with this value
    Key { code: u16, value: i32 },
    /// Device-control usage; emit nothing
    Consumed,
    /// Not a K90-specific usage; use the generic mapping
    Passthrough,
}

/// State the special range acts on
#[derive(Clone)]
pub struct SpecialHandles {
    pub state: SharedState,
    pub backlight: Arc<Led>,
    pub record: Arc<Led>,
}

pub struct EventTranslator {
    keymap: GKeyMap,
    special: Option<SpecialHandles>,
}

impl EventTranslator {
    /// Translator for an interface without special functions
    pub fn new(keymap: GKeyMap) -> Self {
        Self {
            keymap,
            special: None,
        }
    }

    pub fn with_special(keymap: GKeyMap, special: SpecialHandles) -> Self {
        Self {
            keymap,
            special: Some(special),
        }
    }

    pub fn keymap(&self) -> &GKeyMap {
        &self.keymap
    }

    pub fn translate_event(&self, event: UsageEvent) -> Translated {
        self.translate(event.usage, event.value)
    }

    pub fn translate(&self, hid_usage: u32, value: i32) -> Translated {
        match map_usage(hid_usage) {
            UsageClass::GKey(n) => match self.keymap.code(n) {
                Some(code) => Translated::Key { code, value },
                None => Translated::Passthrough,
            },
            UsageClass::Special(id) => {
                if let Some(special) = &self.special {
                    apply_special(special, id);
                }
                Translated::Consumed
            }
            UsageClass::Default => Translated::Passthrough,
        }
    }
}

fn apply_special(special: &SpecialHandles, id: u16) {
    match id {
        usage::MACRO_RECORD_START => special.record.set_brightness(1),
        usage::MACRO_RECORD_STOP => special.record.set_brightness(0),
        usage::M1..=usage::M3 => {
            let profile = (id - usage::M1 + 1) as u8;
            special.state.write().current_profile = profile;
            debug!("profile {} selected on keyboard", profile);
        }
        usage::META_OFF => special.state.write().meta_locked = false,
        // META_ON clears the lock as well; kept for parity with existing behavior
        usage::META_ON => special.state.write().meta_locked = false,
        usage::LIGHT_OFF..=usage::LIGHT_BRIGHT => {
            special
                .backlight
                .update_from_hardware((id - usage::LIGHT_OFF) as u8);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::LedId;
    use crate::state::DeviceState;
    use k90_transport::mock::MockTransport;
    use k90_transport::CommandChannel;
    use parking_lot::RwLock;
    use tokio::runtime::Handle;

    fn translator() -> (Arc<MockTransport>, SpecialHandles, EventTranslator) {
        let mock = Arc::new(MockTransport::new());
        let channel = CommandChannel::new(mock.clone());
        let handles = SpecialHandles {
            state: Arc::new(RwLock::new(DeviceState::default())),
            backlight: Arc::new(Led::spawn(
                LedId::Backlight,
                "t",
                0,
                channel.clone(),
                &Handle::current(),
            )),
            record: Arc::new(Led::spawn(LedId::Record, "t", 0, channel, &Handle::current())),
        };
        let tr = EventTranslator::with_special(GKeyMap::default(), handles.clone());
        (mock, handles, tr)
    }

    #[tokio::test]
    async fn test_gkeys_forwarded() {
        let (_, _, tr) = translator();
        assert_eq!(
            tr.translate(0xd0, 1),
            Translated::Key { code: 183, value: 1 }
        );
        assert_eq!(
            tr.translate(0xe9, 0),
            Translated::Key { code: 0x105, value: 0 }
        );
    }

    #[tokio::test]
    async fn test_special_range_never_forwarded() {
        let (_, _, tr) = translator();
        for u in 0xf0..=0xffu32 {
            for value in [0, 1] {
                assert_eq!(tr.translate(u, value), Translated::Consumed);
            }
        }
    }

    #[tokio::test]
    async fn test_other_usages_pass_through() {
        let (mock, handles, tr) = translator();
        let before = *handles.state.read();
        assert_eq!(tr.translate(0x04, 1), Translated::Passthrough);
        assert_eq!(*handles.state.read(), before);
        assert!(mock.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_mkeys_select_profile() {
        let (mock, handles, tr) = translator();
        tr.translate(0xf3, 1);
        assert_eq!(handles.state.read().current_profile, 3);
        tr.translate(0xf2, 0);
        assert_eq!(handles.state.read().current_profile, 2);
        tr.translate(0xf1, 1);
        assert_eq!(handles.state.read().current_profile, 1);
        // observed, not commanded
        assert!(mock.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_meta_on_clears_lock() {
        let (_, handles, tr) = translator();
        handles.state.write().meta_locked = true;
        tr.translate(0xf5, 1);
        assert!(!handles.state.read().meta_locked);

        handles.state.write().meta_locked = true;
        tr.translate(0xf4, 1);
        assert!(!handles.state.read().meta_locked);
    }

    #[tokio::test]
    async fn test_light_keys_update_cache_only() {
        let (mock, handles, tr) = translator();
        tr.translate(0xfc, 1);
        assert_eq!(handles.backlight.brightness(), 2);
        tr.translate(0xfa, 1);
        assert_eq!(handles.backlight.brightness(), 0);
        tr.translate(0xfd, 1);
        assert_eq!(handles.backlight.brightness(), 3);

        handles.backlight.shutdown().await;
        assert!(mock.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_record_start_defers_to_worker() {
        let (mock, handles, tr) = translator();
        assert_eq!(tr.translate(0xf6, 1), Translated::Consumed);
        assert_eq!(handles.record.brightness(), 1);
        // nothing sent from the translator itself
        assert!(mock.transfers().is_empty());

        handles.record.flush().await;
        let out = mock.outgoing();
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].request, out[0].value), (2, 0x0020));

        tr.translate(0xf7, 1);
        assert_eq!(handles.record.brightness(), 0);
        handles.record.shutdown().await;
        assert_eq!(mock.outgoing()[1].value, 0x0040);
    }

    #[test]
    fn test_without_special_functions() {
        let tr = EventTranslator::new(GKeyMap::default());
        assert_eq!(tr.translate(0xf2, 1), Translated::Consumed);
        assert_eq!(
            tr.translate(0xd1, 1),
            Translated::Key { code: 184, value: 1 }
        );
    }

    #[test]
    fn test_custom_table() {
        let table: Vec<u16> = (2..20).collect();
        let tr = EventTranslator::new(GKeyMap::from_slice(&table).unwrap());
        assert_eq!(
            tr.translate_event(UsageEvent::press(0x0007_00e8)),
            Translated::Key { code: 18, value: 1 }
        );
    }
}
