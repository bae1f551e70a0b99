//! Contact watchdog.
//!
//! Last line of defence against a controlling client that stops talking to
//! us (lost network, crashed app).  Every accepted external interaction
//! calls [`ContactWatchdog::touch`]; a background task compares the ledger
//! against the clock at a fixed cadence.
//!
//! ## Trip lifecycle
//!
//! 1. **Armed** — contact recorded within `timeout`; nothing happens.
//! 2. Silence exceeds `timeout` → **tripped**: the failsafe callback runs
//!    exactly once on the watchdog thread.
//! 3. The ledger is re-armed with a fresh "now" as soon as the callback
//!    returns, so the next trip needs a full timeout of new silence.
//!
//! The callback is not retried if it fails; it only gets the next window.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::WatchdogConfig;
use crate::drivers::task::PeriodicTask;
use crate::error::Result;

/// Shared last-contact ledger.
struct Ledger {
    last_contact: Mutex<Instant>,
    trips: AtomicU32,
}

impl Ledger {
    fn touch(&self) {
        *self.last_contact.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn since_contact(&self) -> Duration {
        self.last_contact
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

pub struct ContactWatchdog {
    ledger: Arc<Ledger>,
    task: PeriodicTask,
}

impl ContactWatchdog {
    /// Arm the watchdog and start its check task.
    ///
    /// `failsafe` is expected to force the relays to a safe configuration.
    pub fn start(config: WatchdogConfig, mut failsafe: impl FnMut() + Send + 'static) -> Result<Self> {
        let ledger = Arc::new(Ledger {
            last_contact: Mutex::new(Instant::now()),
            trips: AtomicU32::new(0),
        });

        let check = ledger.clone();
        let timeout = config.timeout;
        let task = PeriodicTask::spawn("watchdog", config.check_interval, move || {
            let silence = check.since_contact();
            if silence <= timeout {
                return;
            }
            warn!(
                "Watchdog: no contact for {:?} (timeout {:?}), forcing safe state",
                silence, timeout
            );
            check.trips.fetch_add(1, Ordering::SeqCst);
            failsafe();
            check.touch();
        })?;

        info!(
            "Watchdog: armed (timeout={:?}, check every {:?})",
            config.timeout, config.check_interval
        );

        Ok(Self { ledger, task })
    }

    /// Record contact from a client.
    pub fn touch(&self) {
        self.ledger.touch();
    }

    /// Time elapsed since the last recorded contact (or re-arm).
    pub fn since_contact(&self) -> Duration {
        self.ledger.since_contact()
    }

    /// Number of times the failsafe has fired.
    pub fn trips(&self) -> u32 {
        self.ledger.trips.load(Ordering::SeqCst)
    }

    /// Stop the check task.  No failsafe fires after this returns, though an
    /// invocation already in progress runs to completion.
    pub fn close(&mut self) {
        self.task.stop();
    }
}
