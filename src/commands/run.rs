//! G-key daemon
//!
//! Attaches every interface of the first K90 to the driver core, reads HID
//! input reports from each one and forwards translated G-keys to a virtual
//! keyboard until Ctrl-C.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use hidapi::HidApi;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use k90_driver::{K90Config, LoggingHost, VirtualKeyboard};
use k90_keyboard::{DriverRegistry, StateSnapshot, Translated};
use k90_transport::{
    list_devices, open_input, DeviceId, ReportLayout, ReportReader, UsageEvent, UsbTransport,
};

use super::{setup_interrupt_handler, CommandResult};

const EVENT_QUEUE_DEPTH: usize = 256;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run(config: &K90Config) -> CommandResult {
    let running = setup_interrupt_handler();
    let keymap = config.keymap()?;

    let registry = DriverRegistry::new(Arc::new(LoggingHost::new()), keymap.clone())?;
    let mut keyboard = VirtualKeyboard::new(&config.device_name, &keymap)?;
    info!("Created virtual keyboard '{}'", config.device_name);

    let ids = list_devices()?;
    let Some(first) = ids.first().copied() else {
        bail!("No K90 keyboard found");
    };
    // hidraw nodes are matched by interface number only
    let ids: Vec<DeviceId> = ids
        .into_iter()
        .filter(|id| id.bus == first.bus && id.address == first.address)
        .collect();

    let transport = Arc::new(UsbTransport::open(first)?);
    let api = HidApi::new().context("initializing hidapi")?;

    let (tx, mut rx) = mpsc::channel::<(DeviceId, UsageEvent)>(EVENT_QUEUE_DEPTH);
    let mut readers = Vec::new();

    for &id in &ids {
        registry.probe(id, transport.clone()).await?;

        let device = match open_input(&api, id.interface) {
            Ok(device) => device,
            Err(e) => {
                warn!("{}: no input reports: {}", id, e);
                continue;
            }
        };
        let reader = ReportReader::spawn(device, ReportLayout::default(), &id.to_string())?;
        forward_events(id, reader.subscribe(), tx.clone());
        readers.push(reader);
    }
    drop(tx);

    if readers.is_empty() {
        warn!("No input interface could be opened, G-keys will not be forwarded");
    }
    info!("Running, press Ctrl-C to stop");

    let mut last_state: HashMap<DeviceId, StateSnapshot> = HashMap::new();
    while running.load(Ordering::SeqCst) {
        let (id, event) = match tokio::time::timeout(POLL_INTERVAL, rx.recv()).await {
            Ok(Some(item)) => item,
            Ok(None) if readers.is_empty() => {
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            }
            Ok(None) => {
                warn!("All input readers stopped");
                break;
            }
            Err(_) => continue,
        };

        match registry.dispatch(id, event) {
            Some(Translated::Key { code, value }) => {
                debug!("{}: usage 0x{:x} -> key {} = {}", id, event.usage, code, value);
                if let Err(e) = keyboard.emit_key(code, value) {
                    warn!("{}", e);
                }
            }
            Some(Translated::Consumed) => {
                let special = DeviceId::new(id.bus, id.address, 0);
                if let Some(snapshot) = registry.get(special).and_then(|d| d.snapshot()) {
                    if last_state.insert(special, snapshot) != Some(snapshot) {
                        info!(
                            "{}: profile {}, macro mode {}, meta {}, backlight {}/3, record LED {}",
                            special,
                            snapshot.current_profile,
                            snapshot.macro_mode,
                            if snapshot.meta_locked { "locked" } else { "unlocked" },
                            snapshot.backlight,
                            if snapshot.record_led > 0 { "on" } else { "off" },
                        );
                    }
                }
            }
            Some(Translated::Passthrough) | None => {}
        }
    }

    info!("Shutting down");
    for reader in readers {
        reader.stop();
    }
    registry.shutdown().await;
    Ok(())
}

/// Pump one reader's broadcast into the shared event queue
fn forward_events(
    id: DeviceId,
    mut events: broadcast::Receiver<UsageEvent>,
    tx: mpsc::Sender<(DeviceId, UsageEvent)>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if tx.send((id, event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("{}: dropped {} input events", id, n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
