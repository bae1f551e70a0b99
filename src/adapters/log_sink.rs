//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events to the `log`
//! facade (stdout via `env_logger` in `thermctl`).  A push-notification
//! adapter for connected clients would implement the same trait.

use log::{info, warn};

use crate::app::events::{AppEvent, UpdateSource};
use crate::app::ports::EventSink;
use crate::app::state::{Channel, ThermState};

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line summary: `R=on,off,off S=11,00,10`.
fn compact(s: &ThermState) -> String {
    let mut relays = Vec::with_capacity(3);
    let mut sensors = Vec::with_capacity(3);
    for ch in Channel::ALL {
        let c = s.channel(ch);
        relays.push(if c.relay { "on" } else { "off" });
        sensors.push(format!("{}{}", u8::from(c.sensor_a), u8::from(c.sensor_b)));
    }
    format!("R={} S={}", relays.join(","), sensors.join(","))
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | {}", compact(state));
            }
            AppEvent::StateChanged { source, state } => {
                let src = match source {
                    UpdateSource::Interrupt => "interrupt",
                    UpdateSource::Poll => "poll",
                    UpdateSource::Actuation => "actuation",
                };
                info!("STATE | {} | {}", src, compact(state));
            }
            AppEvent::InterruptFault(e) => {
                warn!("FAULT | interrupt: {}", e);
            }
            AppEvent::PollFault(e) => {
                warn!("FAULT | poll: {}", e);
            }
            AppEvent::Actuated { writes } => {
                info!("SET   | {} relay step(s)", writes);
            }
            AppEvent::Throttled => {
                info!("SET   | throttled");
            }
            AppEvent::FailsafeFired => {
                warn!("WDOG  | no contact, forcing safe state");
            }
            AppEvent::Closed => {
                info!("CLOSE | controller stopped");
            }
        }
    }
}
