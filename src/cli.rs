// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use k90_transport::MacroMode;

#[derive(Parser)]
#[command(name = "k90d")]
#[command(author, version, about = "Corsair Vengeance K90 Linux Driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/k90/k90d.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Keyboard to talk to, as BUS:ADDRESS (default: first K90 found)
    #[arg(short, long, global = true, value_parser = parse_bus_address)]
    pub device: Option<(u8, u8)>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Query Commands ===
    /// Show backlight level, active profile and macro mode
    #[command(visible_aliases = ["info", "s"])]
    Status,

    /// List attached K90 interfaces
    #[command(visible_alias = "ls")]
    List,

    // === Set Commands ===
    /// Select the active profile
    #[command(visible_alias = "profile")]
    SetProfile {
        /// Profile number
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        profile: u8,
    },

    /// Switch macro playback between software and hardware
    #[command(visible_alias = "mode")]
    MacroMode {
        #[arg(value_enum)]
        mode: MacroModeArg,
    },

    /// Set backlight brightness
    #[command(visible_aliases = ["light", "bl"])]
    Backlight {
        /// Brightness level (0 = off, 3 = bright)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
        level: u8,
    },

    /// Turn the macro record LED on or off
    RecordLed {
        #[arg(value_enum)]
        state: OnOff,
    },

    // === Profile Blobs ===
    /// Upload key bindings (up to 128 bytes) to a profile
    WriteBindings {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        profile: u8,
        file: PathBuf,
    },

    /// Upload key assignments (up to 64 bytes) to a profile
    WriteKeys {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        profile: u8,
        file: PathBuf,
    },

    /// Upload macro and lighting data (up to 4096 bytes) to a profile
    WriteData {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        profile: u8,
        file: PathBuf,
    },

    // === Daemon ===
    /// Attach to the first K90 and forward G-keys to a virtual keyboard
    #[command(visible_alias = "daemon")]
    Run,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MacroModeArg {
    #[value(name = "SW", alias = "sw")]
    Sw,
    #[value(name = "HW", alias = "hw")]
    Hw,
}

impl From<MacroModeArg> for MacroMode {
    fn from(arg: MacroModeArg) -> Self {
        match arg {
            MacroModeArg::Sw => MacroMode::Software,
            MacroModeArg::Hw => MacroMode::Hardware,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

fn parse_bus_address(s: &str) -> Result<(u8, u8), String> {
    let (bus, address) = s
        .split_once(':')
        .ok_or_else(|| format!("expected BUS:ADDRESS, got {s}"))?;
    let bus = bus.parse().map_err(|_| format!("invalid bus {bus}"))?;
    let address = address
        .parse()
        .map_err(|_| format!("invalid address {address}"))?;
    Ok((bus, address))
}
