//! Driver core for the Corsair Vengeance K90
//!
//! Sits on top of `k90-transport` and provides:
//!
//! - usage mapping for G-keys and the reserved special range
//! - device state (profile, macro mode, meta lock) and the two LEDs
//! - event translation from decoded reports
//! - the three profile slots and the per-device configuration attributes
//! - attach/detach with ordered unwinding, and a registry of attached devices

pub mod attributes;
pub mod device;
pub mod error;
pub mod events;
pub mod host;
pub mod keymap;
pub mod led;
pub mod profile;
pub mod registry;
pub mod state;

pub use attributes::Attributes;
pub use device::{Device, SpecialFunctions};
pub use error::KeyboardError;
pub use events::{EventTranslator, SpecialHandles, Translated};
pub use host::{HostError, HostSurfaces};
pub use keymap::{map_usage, GKeyMap, UsageClass};
pub use led::{Led, LedId};
pub use profile::{Profile, PROFILE_CLASS};
pub use registry::DriverRegistry;
pub use state::{DeviceState, StateSnapshot};

// Re-exported so hosts need only this crate for common types
pub use k90_transport::{BlobKind, DeviceId, MacroMode, UsageEvent};
