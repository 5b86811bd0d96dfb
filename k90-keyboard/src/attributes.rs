//! Per-device configuration surface: `macro_mode` and `current_profile`
//!
//! Stores validate first, perform the transfer without holding the state
//! lock, and update the state only once the keyboard accepted the change.
//! Both stores return the number of input bytes consumed.

use k90_transport::protocol::PROFILE_COUNT;
use k90_transport::{CommandChannel, MacroMode};
use tracing::info;

use crate::error::KeyboardError;
use crate::state::SharedState;

pub const MACRO_MODE: &str = "macro_mode";
pub const CURRENT_PROFILE: &str = "current_profile";

/// Attribute names in registration order
pub const ATTRIBUTE_NAMES: [&str; 2] = [MACRO_MODE, CURRENT_PROFILE];

pub struct Attributes {
    state: SharedState,
    channel: CommandChannel,
}

impl Attributes {
    pub(crate) fn new(state: SharedState, channel: CommandChannel) -> Self {
        Self { state, channel }
    }

    /// `"HW\n"` or `"SW\n"`
    pub fn macro_mode_show(&self) -> String {
        format!("{}\n", self.state.read().macro_mode.label())
    }

    /// Accepts input starting with `SW` or `HW`
    pub fn macro_mode_store(&self, input: &str) -> Result<usize, KeyboardError> {
        let mode = parse_macro_mode(input)?;
        self.channel.set_macro_mode(mode)?;
        self.state.write().macro_mode = mode;
        info!("macro mode set to {}", mode);
        Ok(input.len())
    }

    /// `"<n>\n"`
    pub fn current_profile_show(&self) -> String {
        format!("{}\n", self.state.read().current_profile)
    }

    /// Accepts a decimal profile number 1..=3
    pub fn current_profile_store(&self, input: &str) -> Result<usize, KeyboardError> {
        let profile = parse_profile(input)?;
        self.channel.set_profile(profile)?;
        self.state.write().current_profile = profile;
        info!("active profile set to {}", profile);
        Ok(input.len())
    }

    /// Read an attribute by name
    pub fn show(&self, name: &str) -> Option<String> {
        match name {
            MACRO_MODE => Some(self.macro_mode_show()),
            CURRENT_PROFILE => Some(self.current_profile_show()),
            _ => None,
        }
    }

    /// Write an attribute by name
    pub fn store(&self, name: &str, input: &str) -> Result<usize, KeyboardError> {
        match name {
            MACRO_MODE => self.macro_mode_store(input),
            CURRENT_PROFILE => self.current_profile_store(input),
            _ => Err(KeyboardError::InvalidArgument(format!(
                "unknown attribute {}",
                name
            ))),
        }
    }
}

/// Only the first two characters are compared
pub fn parse_macro_mode(input: &str) -> Result<MacroMode, KeyboardError> {
    let bytes = input.as_bytes();
    if bytes.starts_with(b"SW") {
        Ok(MacroMode::Software)
    } else if bytes.starts_with(b"HW") {
        Ok(MacroMode::Hardware)
    } else {
        Err(KeyboardError::InvalidArgument(format!(
            "macro mode must be SW or HW, got {:?}",
            input
        )))
    }
}

/// Decimal integer with an optional sign and at most one trailing newline
pub fn parse_profile(input: &str) -> Result<u8, KeyboardError> {
    let trimmed = input.strip_suffix('\n').unwrap_or(input);
    let value: i32 = trimmed.parse().map_err(|_| {
        KeyboardError::InvalidArgument(format!("profile must be a number, got {:?}", input))
    })?;
    if value < 1 || value > PROFILE_COUNT as i32 {
        return Err(KeyboardError::InvalidArgument(format!(
            "profile {} out of range 1-{}",
            value, PROFILE_COUNT
        )));
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeviceState;
    use k90_transport::mock::MockTransport;
    use k90_transport::protocol::request;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn attrs() -> (Arc<MockTransport>, SharedState, Attributes) {
        let mock = Arc::new(MockTransport::new());
        let state = Arc::new(RwLock::new(DeviceState::default()));
        let attrs = Attributes::new(state.clone(), CommandChannel::new(mock.clone()));
        (mock, state, attrs)
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!(parse_profile("2").unwrap(), 2);
        assert_eq!(parse_profile("3\n").unwrap(), 3);
        assert_eq!(parse_profile("+1").unwrap(), 1);
        for bad in ["0", "4", "-1", "abc", "", "2\n\n", " 2", "2 "] {
            assert!(
                matches!(parse_profile(bad), Err(KeyboardError::InvalidArgument(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_parse_macro_mode_prefix() {
        assert_eq!(parse_macro_mode("SW").unwrap(), MacroMode::Software);
        assert_eq!(parse_macro_mode("HW\n").unwrap(), MacroMode::Hardware);
        assert_eq!(parse_macro_mode("HWX").unwrap(), MacroMode::Hardware);
        assert!(parse_macro_mode("XX").is_err());
        assert!(parse_macro_mode("S").is_err());
        assert!(parse_macro_mode("sw").is_err());
    }

    #[test]
    fn test_current_profile_rejects_without_transfer() {
        let (mock, state, attrs) = attrs();
        state.write().current_profile = 2;

        for bad in ["0", "4", "two"] {
            assert!(matches!(
                attrs.current_profile_store(bad),
                Err(KeyboardError::InvalidArgument(_))
            ));
        }
        assert_eq!(state.read().current_profile, 2);
        assert!(mock.transfers().is_empty());
    }

    #[test]
    fn test_current_profile_store() {
        let (mock, state, attrs) = attrs();
        assert_eq!(attrs.current_profile_store("3\n").unwrap(), 2);
        assert_eq!(state.read().current_profile, 3);
        assert_eq!(attrs.current_profile_show(), "3\n");

        let out = mock.outgoing();
        assert_eq!((out[0].request, out[0].value), (request::PROFILE, 3));
    }

    #[test]
    fn test_current_profile_failure_keeps_state() {
        let (mock, state, attrs) = attrs();
        mock.fail(request::PROFILE);
        assert!(matches!(
            attrs.current_profile_store("2"),
            Err(KeyboardError::TransferFailed(_))
        ));
        assert_eq!(state.read().current_profile, 1);
    }

    #[test]
    fn test_macro_mode_store() {
        let (mock, state, attrs) = attrs();
        assert_eq!(attrs.macro_mode_show(), "SW\n");

        assert_eq!(attrs.macro_mode_store("HW\n").unwrap(), 3);
        assert_eq!(state.read().macro_mode, MacroMode::Hardware);
        assert_eq!(attrs.macro_mode_show(), "HW\n");
        assert_eq!(mock.outgoing()[0].value, 0x0001);
    }

    #[test]
    fn test_macro_mode_invalid_keeps_state() {
        let (mock, state, attrs) = attrs();
        assert!(matches!(
            attrs.macro_mode_store("XX"),
            Err(KeyboardError::InvalidArgument(_))
        ));
        assert_eq!(state.read().macro_mode, MacroMode::Software);
        assert!(mock.transfers().is_empty());

        mock.fail(request::MACRO_MODE);
        assert!(attrs.macro_mode_store("HW").is_err());
        assert_eq!(state.read().macro_mode, MacroMode::Software);
    }

    #[test]
    fn test_named_access() {
        let (_, _, attrs) = attrs();
        assert_eq!(attrs.show("current_profile").as_deref(), Some("1\n"));
        assert_eq!(attrs.show("nope"), None);
        assert_eq!(attrs.store("current_profile", "2").unwrap(), 1);
        assert!(attrs.store("nope", "1").is_err());
    }
}
