// K90 userspace driver - shared pieces of the k90d binary
// Configuration, host surfaces and the G-key virtual input device

pub mod config;
pub mod host;
pub mod input;

pub use config::K90Config;
pub use host::LoggingHost;
pub use input::{InputError, VirtualKeyboard};
