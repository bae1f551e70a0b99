//! Simulated MCP23S17 bank pair.
//!
//! Stands in for the SPI driver on hosts without the relay board (console,
//! demos, tests).  Behaves like the chip as far as the controller can
//! observe:
//!
//! - `write_all` only changes output bits; input bits keep their levels.
//! - Driving an input line fires the subscribed interrupt handler with the
//!   freshly "read" banks.  Output writes do not raise interrupts.
//! - After `close`, every access fails with [`PortError::Closed`].
//!
//! The handle is cheap to clone; all clones share one chip.

use std::sync::{Arc, Mutex, PoisonError};

use log::info;

use crate::app::ports::{ExpanderPort, InterruptHandler};
use crate::app::state::{Channel, Sensor};
use crate::error::PortError;
use crate::pins::{DEFAULT_LEVELS, IODIR};

struct Chip {
    levels: [u8; 2],
    iodir: [u8; 2],
    closed: bool,
    fail_next_read: bool,
    fail_next_write: bool,
    writes: usize,
}

#[derive(Clone)]
pub struct SimExpander {
    chip: Arc<Mutex<Chip>>,
    handler: Arc<Mutex<Option<Arc<InterruptHandler>>>>,
}

impl Default for SimExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl SimExpander {
    /// Chip at power-on: relays released, sensor lines pulled high (idle).
    pub fn new() -> Self {
        let mut levels = DEFAULT_LEVELS;
        for (lvl, dir) in levels.iter_mut().zip(IODIR) {
            *lvl |= dir;
        }
        Self::with_levels(levels)
    }

    /// Chip with explicit starting levels for both banks.
    pub fn with_levels(levels: [u8; 2]) -> Self {
        info!("SimExpander(sim): banks={:02x?} iodir={:02x?}", levels, IODIR);
        Self {
            chip: Arc::new(Mutex::new(Chip {
                levels,
                iodir: IODIR,
                closed: false,
                fail_next_read: false,
                fail_next_write: false,
                writes: 0,
            })),
            handler: Arc::new(Mutex::new(None)),
        }
    }

    fn chip(&self) -> std::sync::MutexGuard<'_, Chip> {
        self.chip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current raw levels of both banks.
    pub fn levels(&self) -> [u8; 2] {
        self.chip().levels
    }

    /// Successful bulk writes so far.
    pub fn write_count(&self) -> usize {
        self.chip().writes
    }

    pub fn fail_next_read(&self) {
        self.chip().fail_next_read = true;
    }

    pub fn fail_next_write(&self) {
        self.chip().fail_next_write = true;
    }

    /// Drive a sensor input.  Lines are active-low: `active` pulls it LOW.
    /// Fires the interrupt handler if the level changed.
    pub fn set_sensor(&self, ch: Channel, sensor: Sensor, active: bool) {
        let pins = ch.pins();
        let bit = match sensor {
            Sensor::A => pins.sensor_a_bit,
            Sensor::B => pins.sensor_b_bit,
        };
        let idx = pins.bank.index();
        let banks = {
            let mut chip = self.chip();
            if chip.closed {
                return;
            }
            let before = chip.levels[idx];
            if active {
                chip.levels[idx] &= !(1 << bit);
            } else {
                chip.levels[idx] |= 1 << bit;
            }
            if chip.levels[idx] == before {
                return;
            }
            chip.levels
        };
        self.raise(Ok(banks));
    }

    /// Deliver an interrupt carrying a driver error.
    pub fn raise_fault(&self, err: PortError) {
        self.raise(Err(err));
    }

    fn raise(&self, delivered: Result<[u8; 2], PortError>) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(h) = handler {
            (*h)(delivered);
        }
    }
}

impl ExpanderPort for SimExpander {
    fn read_all(&mut self) -> Result<[u8; 2], PortError> {
        let mut chip = self.chip();
        if chip.closed {
            return Err(PortError::Closed);
        }
        if core::mem::take(&mut chip.fail_next_read) {
            return Err(PortError::ReadFailed);
        }
        Ok(chip.levels)
    }

    fn write_all(&mut self, banks: [u8; 2]) -> Result<(), PortError> {
        let mut chip = self.chip();
        if chip.closed {
            return Err(PortError::Closed);
        }
        if core::mem::take(&mut chip.fail_next_write) {
            return Err(PortError::WriteFailed);
        }
        for i in 0..2 {
            let inputs = chip.iodir[i];
            chip.levels[i] = (chip.levels[i] & inputs) | (banks[i] & !inputs);
        }
        chip.writes += 1;
        Ok(())
    }

    fn subscribe_interrupt(&mut self, handler: InterruptHandler) -> Result<(), PortError> {
        if self.chip().closed {
            return Err(PortError::Closed);
        }
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PortError> {
        self.chip().closed = true;
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("SimExpander(sim): closed");
        Ok(())
    }
}
