//! Device state
//!
//! Fields change only from a decoded hardware event or after a host write
//! whose transfer succeeded. LED brightness is not kept here; each [`Led`]
//! owns its own cached value.
//!
//! [`Led`]: crate::led::Led

use std::sync::Arc;

use k90_transport::protocol::PROFILE_COUNT;
use k90_transport::{MacroMode, ModeReport, StatusReport};
use parking_lot::RwLock;
use tracing::warn;

/// Shared handle to one keyboard's state
pub type SharedState = Arc<RwLock<DeviceState>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Active profile, 1..=3
    pub current_profile: u8,
    pub macro_mode: MacroMode,
    pub meta_locked: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            current_profile: 1,
            macro_mode: MacroMode::Software,
            meta_locked: false,
        }
    }
}

impl DeviceState {
    /// Apply the profile from a GET_STATUS block
    pub fn apply_status(&mut self, status: &StatusReport) {
        let profile = status.profile();
        if (1..=PROFILE_COUNT).contains(&profile) {
            self.current_profile = profile;
        } else {
            warn!("K90 reported invalid profile {}, assuming 1", profile);
            self.current_profile = 1;
        }
    }

    /// Apply a GET_MODE response; unknown modes leave the current mode
    pub fn apply_mode(&mut self, report: &ModeReport) {
        match report.mode() {
            Some(mode) => self.macro_mode = mode,
            None => warn!("K90 in unknown mode: {:02x}", report.raw()[0]),
        }
    }
}

/// Point-in-time copy of everything the driver tracks for one keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub current_profile: u8,
    pub macro_mode: MacroMode,
    pub meta_locked: bool,
    pub backlight: u8,
    pub record_led: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = DeviceState::default();
        assert_eq!(state.current_profile, 1);
        assert_eq!(state.macro_mode, MacroMode::Software);
        assert!(!state.meta_locked);
    }

    #[test]
    fn test_apply_status() {
        let mut state = DeviceState::default();
        state.apply_status(&StatusReport::parse(&[0, 0, 0, 0, 2, 0, 0, 3]).unwrap());
        assert_eq!(state.current_profile, 3);

        state.apply_status(&StatusReport::parse(&[0, 0, 0, 0, 2, 0, 0, 9]).unwrap());
        assert_eq!(state.current_profile, 1);
    }

    #[test]
    fn test_apply_mode() {
        let mut state = DeviceState::default();
        state.apply_mode(&ModeReport::from([0x01, 0x00]));
        assert_eq!(state.macro_mode, MacroMode::Hardware);

        // unknown value keeps the previous mode
        state.apply_mode(&ModeReport::from([0x55, 0x00]));
        assert_eq!(state.macro_mode, MacroMode::Hardware);

        state.apply_mode(&ModeReport::from([0x30, 0x00]));
        assert_eq!(state.macro_mode, MacroMode::Software);
    }
}
