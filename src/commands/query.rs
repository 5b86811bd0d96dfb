//! Query (read-only) command handlers.

use super::{open_channel, CommandResult};
use k90_transport::list_devices;

/// Show backlight, profile and macro mode as the keyboard reports them
pub fn status(device: Option<(u8, u8)>) -> CommandResult {
    let channel = open_channel(device)?;
    let status = channel.get_status()?;
    let mode = channel.get_mode()?;

    println!("K90 status:");
    println!("  Backlight:  {}/3", status.backlight());
    println!("  Profile:    {}", status.profile());
    match mode.mode() {
        Some(mode) => println!("  Macro mode: {mode}"),
        None => println!("  Macro mode: unknown (0x{:02x})", mode.raw()[0]),
    }
    Ok(())
}

/// List every interface of every attached K90
pub fn list() -> CommandResult {
    let ids = list_devices()?;
    if ids.is_empty() {
        println!("No K90 keyboard found");
        return Ok(());
    }
    for id in ids {
        println!(
            "Bus {:03} Device {:03} Interface {}{}",
            id.bus,
            id.address,
            id.interface,
            if id.has_special_functions() {
                "  (special functions)"
            } else {
                ""
            }
        );
    }
    Ok(())
}
