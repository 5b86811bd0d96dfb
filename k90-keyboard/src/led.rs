//! LED brightness controller
//!
//! Each LED owns its cached brightness and a Tokio worker task. `set` stores
//! the value and wakes the worker without blocking; the worker sends the
//! latest cached value to the keyboard. Several sets before the worker runs
//! collapse into a single transfer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use k90_transport::protocol::limits;
use k90_transport::{CommandChannel, TransportError};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The two LEDs the driver controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedId {
    /// Blue key backlight, 0..=3
    Backlight,
    /// Red macro-record indicator, 0..=1
    Record,
}

impl LedId {
    pub fn max_brightness(self) -> u8 {
        match self {
            LedId::Backlight => limits::BACKLIGHT_MAX,
            LedId::Record => limits::RECORD_LED_MAX,
        }
    }

    /// Host-visible name, e.g. `001-004.0:blue:backlight`
    pub fn name_for(self, device: &str) -> String {
        match self {
            LedId::Backlight => format!("{}:blue:backlight", device),
            LedId::Record => format!("{}:red:record", device),
        }
    }
}

struct LedShared {
    id: LedId,
    name: String,
    /// Cached value; `requested` and `stopping` change under this lock
    brightness: Mutex<u8>,
    /// Number of accepted `set` calls
    requested: AtomicU64,
    wake: Notify,
    stopping: AtomicBool,
}

/// One LED and its write-behind worker
pub struct Led {
    shared: Arc<LedShared>,
    /// Value of `requested` the worker has caught up with; closed once the
    /// worker exits
    completed: watch::Receiver<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Led {
    /// Create the LED and start its worker on `runtime`
    pub fn spawn(
        id: LedId,
        device: &str,
        initial: u8,
        channel: CommandChannel,
        runtime: &Handle,
    ) -> Self {
        let (done_tx, completed) = watch::channel(0);
        let shared = Arc::new(LedShared {
            id,
            name: id.name_for(device),
            brightness: Mutex::new(initial.min(id.max_brightness())),
            requested: AtomicU64::new(0),
            wake: Notify::new(),
            stopping: AtomicBool::new(false),
        });
        let task = runtime.spawn(run_worker(shared.clone(), channel, done_tx));
        debug!("{}: worker started", shared.name);
        Self {
            shared,
            completed,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn id(&self) -> LedId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn max_brightness(&self) -> u8 {
        self.shared.id.max_brightness()
    }

    /// Cached brightness; never touches the hardware
    pub fn brightness(&self) -> u8 {
        *self.shared.brightness.lock()
    }

    /// Store `value` (clamped to the maximum) and schedule a hardware write
    ///
    /// Returns immediately. Write failures are logged by the worker.
    pub fn set_brightness(&self, value: u8) {
        let value = value.min(self.max_brightness());
        {
            let mut brightness = self.shared.brightness.lock();
            *brightness = value;
            if self.shared.stopping.load(Ordering::SeqCst) {
                return;
            }
            self.shared.requested.fetch_add(1, Ordering::SeqCst);
        }
        self.shared.wake.notify_one();
    }

    /// Record a brightness the keyboard changed on its own; no transfer
    pub fn update_from_hardware(&self, value: u8) {
        *self.shared.brightness.lock() = value.min(self.max_brightness());
    }

    /// Whether a scheduled write has not run yet
    pub fn is_pending(&self) -> bool {
        self.shared.requested.load(Ordering::SeqCst) > *self.completed.borrow()
    }

    /// Wait until every write scheduled so far has run, or the worker is gone
    pub async fn flush(&self) {
        let target = self.shared.requested.load(Ordering::SeqCst);
        let mut rx = self.completed.clone();
        // Err means the worker exited and nothing more will be written
        let _ = rx.wait_for(|&done| done >= target).await;
    }

    /// Run pending writes, stop the worker and wait for it to exit
    pub async fn shutdown(&self) {
        {
            let _guard = self.shared.brightness.lock();
            self.shared.stopping.store(true, Ordering::SeqCst);
        }
        self.shared.wake.notify_one();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("{}: worker ended abnormally: {}", self.shared.name, e);
            }
        }
        debug!("{}: worker stopped", self.shared.name);
    }

}

impl Drop for Led {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

fn write_led(channel: &CommandChannel, id: LedId, value: u8) -> Result<(), TransportError> {
    match id {
        LedId::Backlight => channel.set_brightness(value),
        LedId::Record => channel.set_record_led(value > 0),
    }
}

/// Write the latest value whenever `requested` moves; exit only once
/// stopping with nothing left to write
async fn run_worker(shared: Arc<LedShared>, channel: CommandChannel, completed: watch::Sender<u64>) {
    let mut seen = 0u64;
    loop {
        let (target, value, stopping) = {
            let brightness = shared.brightness.lock();
            (
                shared.requested.load(Ordering::SeqCst),
                *brightness,
                shared.stopping.load(Ordering::SeqCst),
            )
        };

        if target == seen {
            if stopping {
                break;
            }
            shared.wake.notified().await;
            continue;
        }

        let id = shared.id;
        let ch = channel.clone();
        match tokio::task::spawn_blocking(move || write_led(&ch, id, value)).await {
            Ok(Ok(())) => debug!("{}: brightness {} written", shared.name, value),
            Ok(Err(e)) => warn!("{}: failed to set brightness: {}", shared.name, e),
            Err(e) => warn!("{}: brightness write aborted: {}", shared.name, e),
        }
        seen = target;
        completed.send_replace(seen);
    }
}
