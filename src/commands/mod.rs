//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (status, list)
//! - `set`: single-value settings (profile, macro mode, backlight, record LED)
//! - `profile`: per-profile blob uploads
//! - `run`: the G-key daemon

pub mod profile;
pub mod query;
pub mod run;
pub mod set;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use k90_transport::{CommandChannel, DeviceId, UsbTransport};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Open the control channel of the selected keyboard, or the first one found
pub fn open_channel(device: Option<(u8, u8)>) -> anyhow::Result<CommandChannel> {
    let transport = match device {
        Some((bus, address)) => UsbTransport::open(DeviceId::new(bus, address, 0))
            .with_context(|| format!("opening K90 at {bus}:{address}"))?,
        None => UsbTransport::open_first().context("opening K90")?,
    };
    Ok(CommandChannel::new(Arc::new(transport)))
}

/// Set up a Ctrl-C handler that sets the given flag to false when triggered.
/// Returns the Arc<AtomicBool> for use in the main loop.
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}
