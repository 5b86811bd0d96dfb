//! Setting command handlers.

use super::{open_channel, CommandResult};
use k90_transport::MacroMode;

/// Select the active profile (1-3)
pub fn profile(device: Option<(u8, u8)>, profile: u8) -> CommandResult {
    open_channel(device)?.set_profile(profile)?;
    println!("Profile set to {profile}");
    Ok(())
}

/// Switch macro mode
pub fn macro_mode(device: Option<(u8, u8)>, mode: MacroMode) -> CommandResult {
    open_channel(device)?.set_macro_mode(mode)?;
    println!("Macro mode set to {mode}");
    Ok(())
}

/// Set backlight brightness (0-3)
pub fn backlight(device: Option<(u8, u8)>, level: u8) -> CommandResult {
    open_channel(device)?.set_brightness(level)?;
    println!("Backlight set to {level}/3");
    Ok(())
}

pub fn record_led(device: Option<(u8, u8)>, on: bool) -> CommandResult {
    open_channel(device)?.set_record_led(on)?;
    println!("Record LED {}", if on { "on" } else { "off" });
    Ok(())
}
