//! Mock expander and event recorder for integration tests.
//!
//! Records every bulk write with its timestamp so tests can assert on the
//! full write history without an SPI bus.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thermrelay::app::events::AppEvent;
use thermrelay::app::ports::{EventSink, ExpanderPort, InterruptHandler};
use thermrelay::config::ControllerConfig;
use thermrelay::PortError;

/// Banks with every sensor line idle (high) and every relay released.
pub const IDLE: [u8; 2] = [0x66, 0x06];

// ── MockExpander ──────────────────────────────────────────────

#[derive(Default)]
struct Chip {
    banks: [u8; 2],
    writes: Vec<(Instant, [u8; 2])>,
    reads: usize,
    fail_write_at: Option<usize>,
    fail_reads: bool,
    fail_subscribe: bool,
    closed: bool,
    handler: Option<Arc<InterruptHandler>>,
}

/// Shared handle: keep a clone after moving one into the controller.
#[derive(Clone)]
pub struct MockExpander {
    chip: Arc<Mutex<Chip>>,
}

#[allow(dead_code)]
impl MockExpander {
    pub fn new(banks: [u8; 2]) -> Self {
        Self {
            chip: Arc::new(Mutex::new(Chip {
                banks,
                ..Chip::default()
            })),
        }
    }

    pub fn banks(&self) -> [u8; 2] {
        self.chip.lock().unwrap().banks
    }

    /// Change the pins without raising an interrupt.
    pub fn set_banks(&self, banks: [u8; 2]) {
        self.chip.lock().unwrap().banks = banks;
    }

    pub fn writes(&self) -> Vec<(Instant, [u8; 2])> {
        self.chip.lock().unwrap().writes.clone()
    }

    pub fn reads(&self) -> usize {
        self.chip.lock().unwrap().reads
    }

    /// Fail the `n`th write attempt (0-based, counted from now on).
    pub fn fail_write_at(&self, n: usize) {
        let mut chip = self.chip.lock().unwrap();
        chip.fail_write_at = Some(chip.writes.len() + n);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.chip.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_subscribe(&self) {
        self.chip.lock().unwrap().fail_subscribe = true;
    }

    pub fn is_closed(&self) -> bool {
        self.chip.lock().unwrap().closed
    }

    /// Drive the pins and deliver an interrupt, like the chip would.
    pub fn interrupt(&self, banks: [u8; 2]) {
        self.set_banks(banks);
        self.deliver(Ok(banks));
    }

    /// Deliver an interrupt carrying a driver error.
    pub fn interrupt_fault(&self, err: PortError) {
        self.deliver(Err(err));
    }

    fn deliver(&self, delivered: Result<[u8; 2], PortError>) {
        let handler = self.chip.lock().unwrap().handler.clone();
        let handler = handler.expect("controller never subscribed");
        (*handler)(delivered);
    }
}

impl ExpanderPort for MockExpander {
    fn read_all(&mut self) -> Result<[u8; 2], PortError> {
        let mut chip = self.chip.lock().unwrap();
        if chip.closed {
            return Err(PortError::Closed);
        }
        if chip.fail_reads {
            return Err(PortError::ReadFailed);
        }
        chip.reads += 1;
        Ok(chip.banks)
    }

    fn write_all(&mut self, banks: [u8; 2]) -> Result<(), PortError> {
        let mut chip = self.chip.lock().unwrap();
        if chip.closed {
            return Err(PortError::Closed);
        }
        if chip.fail_write_at == Some(chip.writes.len()) {
            chip.fail_write_at = None;
            return Err(PortError::WriteFailed);
        }
        chip.banks = banks;
        chip.writes.push((Instant::now(), banks));
        Ok(())
    }

    fn subscribe_interrupt(&mut self, handler: InterruptHandler) -> Result<(), PortError> {
        let mut chip = self.chip.lock().unwrap();
        if chip.fail_subscribe {
            return Err(PortError::InterruptFailed);
        }
        chip.handler = Some(Arc::new(handler));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        let mut chip = self.chip.lock().unwrap();
        chip.closed = true;
        chip.handler = None;
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AppEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Config whose background tasks stay out of the way of a short test.
pub fn quiet_config() -> ControllerConfig {
    ControllerConfig {
        poll_period_ms: 60_000,
        ..ControllerConfig::default()
    }
}

/// Poll `cond` every 10 ms until it holds or `limit` passes.
pub fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}
