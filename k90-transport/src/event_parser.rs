//! Input report decoding
//!
//! The K90 reports keys as a keyboard array report: a modifier bitmap, a
//! reserved byte, then up to N usage ids of currently held keys. The decoder
//! diffs consecutive reports into press/release transitions; the reader
//! thread does this continuously for one HID interface and broadcasts the
//! resulting [`UsageEvent`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol::{timing, PRODUCT_ID, VENDOR_ID};
use crate::types::UsageEvent;

/// HID keyboard/keypad usage page, shifted into the high half of a usage
pub const KEYBOARD_PAGE: u32 = 0x0007_0000;

/// Usage id that fills every slot when too many keys are held
const ERROR_ROLL_OVER: u8 = 0x01;

/// Broadcast channel capacity for decoded usage events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Where the usage array lives inside a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    /// Leading report id, if the interface numbers its reports
    pub report_id: Option<u8>,
    /// Offset of the first array slot after the report id
    pub array_offset: usize,
}

impl Default for ReportLayout {
    /// Boot protocol layout: `[modifiers, reserved, k0..k5]`
    fn default() -> Self {
        Self {
            report_id: None,
            array_offset: 2,
        }
    }
}

/// Turns a stream of array reports into key transitions
#[derive(Debug, Default)]
pub struct ReportDecoder {
    layout: ReportLayout,
    held: Vec<u8>,
}

impl ReportDecoder {
    pub fn new(layout: ReportLayout) -> Self {
        Self {
            layout,
            held: Vec::new(),
        }
    }

    /// Decode one report
    ///
    /// Releases are emitted before presses. Reports with a foreign report id,
    /// truncated reports and roll-over error reports produce nothing and leave
    /// the held set untouched.
    pub fn decode(&mut self, report: &[u8]) -> Vec<UsageEvent> {
        let body = match self.layout.report_id {
            Some(id) => match report.split_first() {
                Some((&rid, rest)) if rid == id => rest,
                _ => return Vec::new(),
            },
            None => report,
        };
        if body.len() <= self.layout.array_offset {
            return Vec::new();
        }
        let slots = &body[self.layout.array_offset..];
        if slots.contains(&ERROR_ROLL_OVER) {
            debug!("roll-over report ignored");
            return Vec::new();
        }

        let mut current: Vec<u8> = Vec::with_capacity(slots.len());
        for &u in slots {
            if u != 0 && !current.contains(&u) {
                current.push(u);
            }
        }

        let mut events = Vec::new();
        for &u in &self.held {
            if !current.contains(&u) {
                events.push(UsageEvent::release(KEYBOARD_PAGE | u as u32));
            }
        }
        for &u in &current {
            if !self.held.contains(&u) {
                events.push(UsageEvent::press(KEYBOARD_PAGE | u as u32));
            }
        }
        self.held = current;
        events
    }

    /// Forget held keys (device reopened)
    pub fn reset(&mut self) {
        self.held.clear();
    }
}

/// Open the hidraw node of one K90 interface
pub fn open_input(api: &HidApi, interface: u8) -> Result<HidDevice, TransportError> {
    let info = api
        .device_list()
        .find(|d| {
            d.vendor_id() == VENDOR_ID
                && d.product_id() == PRODUCT_ID
                && d.interface_number() == interface as i32
        })
        .ok_or_else(|| TransportError::DeviceNotFound(format!("K90 HID interface {}", interface)))?;
    debug!("opening input interface {} at {:?}", interface, info.path());
    Ok(info.open_device(api)?)
}

/// Background reader for one HID interface
///
/// Decoded events are broadcast to every subscriber. Dropping the reader
/// signals the thread to exit on its next read timeout.
pub struct ReportReader {
    tx: broadcast::Sender<UsageEvent>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReportReader {
    pub fn spawn(device: HidDevice, layout: ReportLayout, name: &str) -> Result<Self, TransportError> {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let tx_clone = tx.clone();
        let shutdown_clone = shutdown.clone();
        let label = name.to_string();

        let thread = std::thread::Builder::new()
            .name(format!("{}-report-reader", name))
            .spawn(move || {
                run_report_reader_loop(device, ReportDecoder::new(layout), tx_clone, shutdown_clone, &label);
            })
            .map_err(|e| TransportError::Hid(format!("failed to spawn reader thread: {}", e)))?;

        Ok(Self {
            tx,
            shutdown,
            thread: Some(thread),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UsageEvent> {
        self.tx.subscribe()
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("report reader thread panicked");
            }
        }
    }
}

impl Drop for ReportReader {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_report_reader_loop(
    device: HidDevice,
    mut decoder: ReportDecoder,
    tx: broadcast::Sender<UsageEvent>,
    shutdown: Arc<AtomicBool>,
    name: &str,
) {
    debug!("{} report reader thread started", name);
    let mut buf = [0u8; 64];

    while !shutdown.load(Ordering::Relaxed) {
        match device.read_timeout(&mut buf, timing::REPORT_READ_TIMEOUT_MS) {
            Ok(len) if len > 0 => {
                debug!("{} report: {:02X?}", name, &buf[..len]);
                for event in decoder.decode(&buf[..len]) {
                    // no receivers is fine
                    let _ = tx.send(event);
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{} report reader error: {}", name, e);
                std::thread::sleep(Duration::from_millis(timing::REPORT_ERROR_SLEEP_MS));
            }
        }
    }

    debug!("{} report reader thread exiting", name);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(id: u8) -> u32 {
        KEYBOARD_PAGE | id as u32
    }

    #[test]
    fn test_press_and_release() {
        let mut dec = ReportDecoder::default();

        let events = dec.decode(&[0, 0, 0xd0, 0, 0, 0, 0, 0]);
        assert_eq!(events, vec![UsageEvent::press(usage(0xd0))]);

        let events = dec.decode(&[0; 8]);
        assert_eq!(events, vec![UsageEvent::release(usage(0xd0))]);
    }

    #[test]
    fn test_release_before_press() {
        let mut dec = ReportDecoder::default();
        dec.decode(&[0, 0, 0xf1, 0, 0, 0, 0, 0]);

        let events = dec.decode(&[0, 0, 0xf2, 0, 0, 0, 0, 0]);
        assert_eq!(
            events,
            vec![
                UsageEvent::release(usage(0xf1)),
                UsageEvent::press(usage(0xf2))
            ]
        );
    }

    #[test]
    fn test_held_key_not_repeated() {
        let mut dec = ReportDecoder::default();
        dec.decode(&[0, 0, 0xe8, 0, 0, 0, 0, 0]);
        let events = dec.decode(&[0, 0, 0xe8, 0xe9, 0, 0, 0, 0]);
        assert_eq!(events, vec![UsageEvent::press(usage(0xe9))]);
    }

    #[test]
    fn test_roll_over_ignored() {
        let mut dec = ReportDecoder::default();
        dec.decode(&[0, 0, 0xd3, 0, 0, 0, 0, 0]);
        assert!(dec.decode(&[0, 0, 1, 1, 1, 1, 1, 1]).is_empty());
        // state kept across the error report
        assert!(dec.decode(&[0, 0, 0xd3, 0, 0, 0, 0, 0]).is_empty());
    }

    #[test]
    fn test_report_id_filter() {
        let mut dec = ReportDecoder::new(ReportLayout {
            report_id: Some(1),
            array_offset: 2,
        });
        assert!(dec.decode(&[2, 0, 0, 0xd0]).is_empty());
        assert_eq!(
            dec.decode(&[1, 0, 0, 0xd0]),
            vec![UsageEvent::press(usage(0xd0))]
        );
    }

    #[test]
    fn test_truncated_report() {
        let mut dec = ReportDecoder::default();
        assert!(dec.decode(&[0, 0]).is_empty());
        assert!(dec.decode(&[]).is_empty());
    }

    #[test]
    fn test_reset() {
        let mut dec = ReportDecoder::default();
        dec.decode(&[0, 0, 0xd0, 0, 0, 0, 0, 0]);
        dec.reset();
        assert_eq!(
            dec.decode(&[0, 0, 0xd0, 0, 0, 0, 0, 0]),
            vec![UsageEvent::press(usage(0xd0))]
        );
    }
}
