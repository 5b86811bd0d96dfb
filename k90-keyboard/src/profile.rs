//! On-device profile slots
//!
//! The keyboard stores three profiles. Nothing is cached on the host side:
//! each write goes straight to the keyboard and the profile keeps no copy.

use k90_transport::protocol::PROFILE_COUNT;
use k90_transport::{BlobKind, CommandChannel};
use tracing::{debug, info};

use crate::error::KeyboardError;

/// Host device class the profile surfaces are registered under
pub const PROFILE_CLASS: &str = "k90_profile";

/// One profile slot
pub struct Profile {
    number: u8,
    name: String,
    channel: CommandChannel,
}

impl Profile {
    pub(crate) fn new(number: u8, device: &str, channel: CommandChannel) -> Self {
        Self {
            number,
            name: format!("{}:profile{}", device, number),
            channel,
        }
    }

    /// Build the three slots, numbered 1..=3
    pub(crate) fn all(device: &str, channel: &CommandChannel) -> Vec<Profile> {
        (1..=PROFILE_COUNT)
            .map(|n| Profile::new(n, device, channel.clone()))
            .collect()
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// Host-visible name, `<device>:profile<N>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only `profile_number` attribute
    pub fn profile_number_show(&self) -> String {
        format!("{}\n", self.number)
    }

    /// Upload one blob; returns the number of bytes consumed
    pub fn write(&self, kind: BlobKind, data: &[u8]) -> Result<usize, KeyboardError> {
        debug!("{}: writing {} bytes of {}", self.name, data.len(), kind);
        self.channel.write_profile_blob(kind, self.number, data)?;
        info!("{}: {} updated", self.name, kind);
        Ok(data.len())
    }

    pub fn write_bindings(&self, data: &[u8]) -> Result<usize, KeyboardError> {
        self.write(BlobKind::Bindings, data)
    }

    pub fn write_keys(&self, data: &[u8]) -> Result<usize, KeyboardError> {
        self.write(BlobKind::Keys, data)
    }

    pub fn write_data(&self, data: &[u8]) -> Result<usize, KeyboardError> {
        self.write(BlobKind::Data, data)
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("number", &self.number)
            .field("name", &self.name)
            .finish()
    }
}
