//! Corsair K90 Driver CLI
//!
//! One-shot commands talk to the keyboard directly; `run` attaches the
//! driver core and forwards G-keys until interrupted.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use k90_driver::K90Config;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config first: it may carry the log level
    let config_path = cli.config.clone().unwrap_or_else(K90Config::default_path);
    let config = K90Config::load(&config_path)?;

    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    info!("Config: {:?}", config_path);

    let device = cli.device;
    match cli.command {
        None | Some(Commands::Status) => commands::query::status(device)?,
        Some(Commands::List) => commands::query::list()?,

        Some(Commands::SetProfile { profile }) => commands::set::profile(device, profile)?,
        Some(Commands::MacroMode { mode }) => commands::set::macro_mode(device, mode.into())?,
        Some(Commands::Backlight { level }) => commands::set::backlight(device, level)?,
        Some(Commands::RecordLed { state }) => {
            commands::set::record_led(device, state == cli::OnOff::On)?
        }

        Some(Commands::WriteBindings { profile, file }) => {
            commands::profile::write_blob(device, k90_transport::BlobKind::Bindings, profile, &file)?
        }
        Some(Commands::WriteKeys { profile, file }) => {
            commands::profile::write_blob(device, k90_transport::BlobKind::Keys, profile, &file)?
        }
        Some(Commands::WriteData { profile, file }) => {
            commands::profile::write_blob(device, k90_transport::BlobKind::Data, profile, &file)?
        }

        Some(Commands::Run) => commands::run::run(&config).await?,
    }

    Ok(())
}
