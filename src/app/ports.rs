//! Port traits — the hexagonal boundary between the controller core and
//! the outside world.
//!
//! ```text
//!   Driver / adapter ──▶ Port trait ──▶ ThermController (core)
//! ```
//!
//! The expander driver, event consumers and configuration sources
//! implement these traits.  [`ThermController`](super::service::ThermController)
//! consumes them, so the core never touches SPI or GPIO directly.

use crate::config::ControllerConfig;
use crate::error::{ConfigError, PortError};

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Expander port (driven adapter: hardware ↔ core)
// ───────────────────────────────────────────────────────────────

/// Callback the driver invokes when the expander raises an interrupt.
///
/// Carries the freshly read bank bytes, or the error the driver hit while
/// reading them.  May be called from any thread, concurrently with every
/// other port and controller operation.
pub type InterruptHandler = Box<dyn Fn(Result<[u8; 2], PortError>) + Send + Sync + 'static>;

/// Bulk access to the two expander banks.
///
/// The driver is expected to be initialised already (pin directions and
/// default levels configured, see [`crate::pins`]).  The controller
/// serialises every call through one lock, so implementations need not be
/// internally synchronised.
pub trait ExpanderPort: Send {
    /// Read both banks: `[GPA, GPB]`.
    fn read_all(&mut self) -> Result<[u8; 2], PortError>;

    /// Write both banks in a single bus transaction.
    fn write_all(&mut self, banks: [u8; 2]) -> Result<(), PortError>;

    /// Register the interrupt callback.  Replaces any previous handler.
    fn subscribe_interrupt(&mut self, handler: InterruptHandler) -> Result<(), PortError>;

    /// Release the bus.  Further access fails with [`PortError::Closed`].
    fn close(&mut self) -> Result<(), PortError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging / push)
// ───────────────────────────────────────────────────────────────

/// The core emits [`AppEvent`]s through this port.  Adapters decide where
/// they go (log, push notification to clients, test recorder).
///
/// Emitted from the interrupt, poll, watchdog and caller threads, hence
/// `&self` and `Sync`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AppEvent);
}

/// Sink that drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &AppEvent) {}
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: core ↔ config source)
// ───────────────────────────────────────────────────────────────

/// Loads and persists controller configuration.
///
/// Implementations MUST validate before returning or persisting; invalid
/// values are rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration.  [`ConfigError::NotFound`] if none is stored.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ControllerConfig) -> Result<(), ConfigError>;
}
