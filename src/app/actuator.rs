//! Relay actuator — the only path that writes to the expander.
//!
//! ## Actuation sequence
//!
//! 1. Take the actuation lock (serialises every `apply`).
//! 2. Reject if the previous accepted actuation is younger than the
//!    minimum period.  A rejected call touches neither ledger nor hardware.
//! 3. Reserve the throttle window, then read the banks.
//! 4. For channels 1, 2, 3 in order: if the relay bit differs from the
//!    request, merge that single bit and write both banks.  Consecutive
//!    writes are separated by the step delay to bound inrush current.
//! 5. Reconcile the store from the last bytes sent (or read, if nothing
//!    changed).
//!
//! A bus failure aborts the sequence.  Relays already switched stay
//! switched and the store keeps its previous snapshot until the next poll
//! or interrupt observes the hardware.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::ControllerConfig;
use crate::error::{Error, Result};

use super::ports::ExpanderPort;
use super::state::{Channel, RawPins, ThermState};
use super::store::StateStore;

/// Outcome of an accepted actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuation {
    /// Relay steps written to the bus.
    pub writes: usize,
    /// Snapshot published after the sequence.
    pub state: ThermState,
}

pub struct RelayActuator {
    /// Instant of the last accepted actuation.  Doubles as the actuation lock.
    ledger: Mutex<Option<Instant>>,
    min_period: Duration,
    step_delay: Duration,
}

impl RelayActuator {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            ledger: Mutex::new(None),
            min_period: config.min_actuation_period(),
            step_delay: config.relay_step_delay(),
        }
    }

    /// Drive the relays towards `requested`.  Sensor fields are ignored.
    ///
    /// `port` is locked for the whole read/write sequence so no poll read
    /// can interleave with a partially merged write.
    pub(crate) fn apply<P: ExpanderPort + ?Sized>(
        &self,
        port: &Mutex<P>,
        store: &StateStore,
        requested: &ThermState,
    ) -> Result<Actuation> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        if let Some(last) = *ledger {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_period {
                let retry_after = self.min_period - elapsed;
                return Err(Error::Throttled {
                    retry_after_ms: retry_after.as_millis().max(1) as u64,
                });
            }
        }
        *ledger = Some(now);

        let mut port = port.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pins = RawPins::from_banks(port.read_all()?);

        let mut writes = 0;
        for ch in Channel::ALL {
            let want = requested.relay(ch);
            if pins.relay(ch) == want {
                continue;
            }
            if writes > 0 {
                std::thread::sleep(self.step_delay);
            }
            pins = pins.with_relay(ch, want);
            port.write_all(pins.banks())?;
            writes += 1;
            debug!("relay {} -> {}", ch.number(), if want { "ON" } else { "OFF" });
        }

        store.reconcile(pins);
        Ok(Actuation {
            writes,
            state: pins.to_state(),
        })
    }
}
