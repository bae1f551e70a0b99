//! Cancellable periodic background tasks.
//!
//! Each task owns a dedicated named thread that drives an async loop with
//! `futures_lite::future::block_on`.  Every period the loop races an
//! `async-io-mini` reactor timer against the task's stop [`Signal`]:
//!
//! ```text
//!   ┌──────────────── task thread ────────────────┐
//!   │  loop {                                     │
//!   │     or( stop.wait() , Timer::after(period) )│
//!   │       stop  ──▶ exit                        │
//!   │       timer ──▶ tick()                      │
//!   │  }                                          │
//!   └─────────────────────────────────────────────┘
//! ```
//!
//! The signal latches, so a stop raised before the thread first waits is
//! never lost.  A tick already running is allowed to finish.

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

use crate::error::{Error, Result};

type StopSignal = Signal<CriticalSectionRawMutex, ()>;

/// Stack size for background task threads.
const TASK_STACK_KB: usize = 64;

/// Handle to a running periodic task.  Dropping it stops the task.
pub struct PeriodicTask {
    name: &'static str,
    stop: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` to run every `period` until [`stop`](Self::stop).
    pub fn spawn(
        name: &'static str,
        period: Duration,
        mut tick: impl FnMut() + Send + 'static,
    ) -> Result<Self> {
        let stop = Arc::new(StopSignal::new());
        let task_stop = stop.clone();

        info!("Spawning '{}' (period={:?}, stack={}KB)", name, period, TASK_STACK_KB);

        let handle = std::thread::Builder::new()
            .name(name.into())
            .stack_size(TASK_STACK_KB * 1024)
            .spawn(move || {
                futures_lite::future::block_on(async move {
                    loop {
                        let stopped = futures_lite::future::or(
                            async {
                                task_stop.wait().await;
                                true
                            },
                            async {
                                async_io_mini::Timer::after(period).await;
                                false
                            },
                        )
                        .await;
                        if stopped {
                            break;
                        }
                        tick();
                    }
                });
            })
            .map_err(|e| {
                warn!("task '{}': thread spawn failed: {}", name, e);
                Error::Init("background task spawn failed")
            })?;

        Ok(Self {
            name,
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the task to stop and wait for its thread to exit.
    ///
    /// Idempotent.  When called from the task's own thread (e.g. a tick
    /// that closes its owner) the thread is detached instead of joined.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.signal(());
        if handle.thread().id() == std::thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!("task '{}' panicked", self.name);
        } else {
            info!("task '{}' stopped", self.name);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
