//! Outbound controller events.
//!
//! The [`ThermController`](super::service::ThermController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide where they go (log, push to connected clients).

use crate::error::PortError;

use super::state::ThermState;

/// Which path published a snapshot into the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// Expander interrupt delivered fresh bytes.
    Interrupt,
    /// Backstop poll read.
    Poll,
    /// Post-actuation reconcile.
    Actuation,
}

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller finished its initial read (carries initial state).
    Started(ThermState),

    /// A new snapshot was published.  Interrupt updates are always
    /// reported; poll updates only when the snapshot actually changed.
    StateChanged {
        source: UpdateSource,
        state: ThermState,
    },

    /// The driver reported an error on an interrupt.  The store kept its
    /// previous snapshot.
    InterruptFault(PortError),

    /// The backstop poll failed to read.  The store kept its previous
    /// snapshot.
    PollFault(PortError),

    /// An actuation completed; `writes` relay steps hit the bus.
    Actuated { writes: usize },

    /// An actuation was rejected by the throttle.
    Throttled,

    /// The watchdog lost contact and forced the safe state.
    FailsafeFired,

    /// The controller was closed.
    Closed,
}
