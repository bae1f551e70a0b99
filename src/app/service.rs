//! Controller service — the hexagonal core.
//!
//! [`ThermController`] owns the state store, the relay actuator, the
//! backstop poll task, the interrupt wiring and the contact watchdog.
//! All hardware access flows through the injected [`ExpanderPort`].
//!
//! ```text
//!   interrupt ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!   poll task ──▶ │        StateStore           │ ◀── get_state()
//!                 │                             │
//!   set_state() ─▶│  RelayActuator ──▶ port     │
//!   watchdog ───▶ │  (failsafe = SAFE_STATE)    │ ◀── touch_watchdog()
//!                 └─────────────────────────────┘
//! ```
//!
//! ## Hardware access
//!
//! The port lives behind one mutex.  The actuator holds it for its whole
//! read/merge/write sequence and the poll path holds it across read and
//! reconcile, so a poll can never publish bytes older than a completed
//! actuation.  The interrupt path never touches the port; it publishes the
//! bytes the driver hands it (last writer wins).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use log::{error, info, warn};

use crate::config::ControllerConfig;
use crate::drivers::task::PeriodicTask;
use crate::error::{Error, PortError, Result};
use crate::watchdog::ContactWatchdog;

use super::actuator::RelayActuator;
use super::events::{AppEvent, UpdateSource};
use super::ports::{EventSink, ExpanderPort, InterruptHandler};
use super::state::{RawPins, SAFE_STATE, ThermState};
use super::store::StateStore;

// ───────────────────────────────────────────────────────────────
// Shared core
// ───────────────────────────────────────────────────────────────

struct Core<P> {
    port: Mutex<P>,
    store: StateStore,
    actuator: RelayActuator,
    sink: Arc<dyn EventSink>,
    closed: AtomicBool,
}

impl<P: ExpanderPort> Core<P> {
    fn set_state(&self, requested: &ThermState) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Hardware(PortError::Closed));
        }
        match self.actuator.apply(&self.port, &self.store, requested) {
            Ok(done) => {
                if done.writes > 0 {
                    self.sink.emit(&AppEvent::StateChanged {
                        source: UpdateSource::Actuation,
                        state: done.state,
                    });
                }
                self.sink.emit(&AppEvent::Actuated { writes: done.writes });
                Ok(())
            }
            Err(e) if e.is_throttled() => {
                self.sink.emit(&AppEvent::Throttled);
                Err(e)
            }
            Err(e) => {
                warn!("actuation failed: {}", e);
                Err(e)
            }
        }
    }

    /// One backstop poll step: bulk read and reconcile under the port lock.
    fn poll(&self) -> Result<ThermState> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Hardware(PortError::Closed));
        }
        let (prev, state) = {
            let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
            let raw = match port.read_all() {
                Ok(banks) => RawPins::from_banks(banks),
                Err(e) => {
                    drop(port);
                    self.sink.emit(&AppEvent::PollFault(e));
                    return Err(e.into());
                }
            };
            (self.store.reconcile(raw), raw.to_state())
        };
        if prev != state {
            self.sink.emit(&AppEvent::StateChanged {
                source: UpdateSource::Poll,
                state,
            });
        }
        Ok(state)
    }

    fn on_interrupt(&self, delivered: core::result::Result<[u8; 2], PortError>) {
        match delivered {
            Ok(banks) => {
                let raw = RawPins::from_banks(banks);
                self.store.reconcile(raw);
                self.sink.emit(&AppEvent::StateChanged {
                    source: UpdateSource::Interrupt,
                    state: raw.to_state(),
                });
            }
            Err(e) => {
                warn!("interrupt reported error: {} (keeping last state)", e);
                self.sink.emit(&AppEvent::InterruptFault(e));
            }
        }
    }

    fn failsafe(&self) {
        self.sink.emit(&AppEvent::FailsafeFired);
        match self.set_state(&SAFE_STATE) {
            Ok(()) => warn!("Watchdog reverted to safe state: no contact for a while"),
            Err(e) => warn!("Watchdog failsafe could not apply safe state: {}", e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ThermController
// ───────────────────────────────────────────────────────────────

/// Top-level relay/sensor controller.
pub struct ThermController<P: ExpanderPort + 'static> {
    core: Arc<Core<P>>,
    poller: PeriodicTask,
    watchdog: ContactWatchdog,
}

impl<P: ExpanderPort + 'static> ThermController<P> {
    /// Validate `config`, read the initial state from `port`, then start
    /// the interrupt path, the poll task and the watchdog.
    pub fn new(mut port: P, config: &ControllerConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;

        let initial = match port.read_all() {
            Ok(banks) => RawPins::from_banks(banks),
            Err(e) => {
                error!("ThermController: initial read failed: {}", e);
                return Err(e.into());
            }
        };
        let core = Arc::new(Core {
            port: Mutex::new(port),
            store: StateStore::new(initial),
            actuator: RelayActuator::new(config),
            sink,
            closed: AtomicBool::new(false),
        });

        let (poller, watchdog) = match Self::wire(&core, config) {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("ThermController: startup failed: {}", e);
                if let Err(close_err) = core.port.lock().unwrap_or_else(PoisonError::into_inner).close() {
                    warn!("close after failed startup: {}", close_err);
                }
                return Err(e);
            }
        };

        let state = core.store.get();
        core.sink.emit(&AppEvent::Started(state));
        info!("ThermController started:\n{}", state);

        Ok(Self { core, poller, watchdog })
    }

    /// Subscribe the interrupt handler and start the poll and watchdog tasks.
    /// A task already started is stopped again when a later step fails.
    fn wire(core: &Arc<Core<P>>, config: &ControllerConfig) -> Result<(PeriodicTask, ContactWatchdog)> {
        let weak: Weak<Core<P>> = Arc::downgrade(core);
        let handler: InterruptHandler = Box::new(move |delivered| {
            if let Some(core) = weak.upgrade() {
                core.on_interrupt(delivered);
            }
        });
        core.port
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe_interrupt(handler)?;

        let weak = Arc::downgrade(core);
        let poller = PeriodicTask::spawn("state-poll", config.poll_period(), move || {
            if let Some(core) = weak.upgrade() {
                if let Err(e) = core.poll() {
                    warn!("poll: {} (keeping last state)", e);
                }
            }
        })?;

        let weak = Arc::downgrade(core);
        let watchdog = ContactWatchdog::start(config.watchdog(), move || {
            if let Some(core) = weak.upgrade() {
                core.failsafe();
            }
        })?;

        Ok((poller, watchdog))
    }

    /// Last published snapshot.
    pub fn get_state(&self) -> ThermState {
        self.core.store.get()
    }

    /// Drive the relays to `requested` (sensor fields are ignored).
    ///
    /// Fails with [`Error::Throttled`] inside the minimum actuation period
    /// and with [`Error::Hardware`] on a bus failure; relays switched before
    /// the failure stay switched.
    pub fn set_state(&self, requested: &ThermState) -> Result<()> {
        self.core.set_state(requested)
    }

    /// Run one poll step now instead of waiting for the next period.
    pub fn refresh(&self) -> Result<ThermState> {
        self.core.poll()
    }

    /// Record client contact.
    pub fn touch_watchdog(&self) {
        self.watchdog.touch();
    }

    /// Time since the last client contact (or watchdog re-arm).
    pub fn since_contact(&self) -> Duration {
        self.watchdog.since_contact()
    }

    /// Number of times the watchdog has forced the safe state.
    pub fn failsafe_trips(&self) -> u32 {
        self.watchdog.trips()
    }

    pub fn is_closed(&self) -> bool {
        self.core.closed.load(Ordering::Acquire)
    }

    /// Stop the background tasks and release the port.
    ///
    /// An actuation already in progress completes first.  Interrupt
    /// callbacks still in flight may publish once more.  Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.core.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.poller.stop();
        self.watchdog.close();

        let result = self
            .core
            .port
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
        self.core.sink.emit(&AppEvent::Closed);
        info!("ThermController closed");
        result.map_err(Error::from)
    }
}

impl<P: ExpanderPort + 'static> Drop for ThermController<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("close on drop: {}", e);
        }
    }
}
