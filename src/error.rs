//! Unified error types for the relay controller.
//!
//! A single `Error` enum that every subsystem converts into, so callers of
//! the controller surface handle one type. All variants are `Copy` so they
//! can be handed to event sinks and logged from interrupt context without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible controller operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An actuation was rejected because the previous one was too recent.
    /// Retriable once `retry_after_ms` has elapsed. No state was changed.
    Throttled { retry_after_ms: u64 },
    /// The expander bulk read/write failed.
    Hardware(PortError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A background task or peripheral could not be started.
    Init(&'static str),
}

impl Error {
    pub const fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled { .. })
    }

    pub const fn is_hardware(&self) -> bool {
        matches!(self, Self::Hardware(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Throttled { retry_after_ms } => {
                write!(f, "throttling: too many requests (retry in {retry_after_ms} ms)")
            }
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Expander port errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// Bulk read of the pin banks failed.
    ReadFailed,
    /// Bulk write of the pin banks failed.
    WriteFailed,
    /// The driver reported a failure while servicing an interrupt.
    InterruptFailed,
    /// The port has been closed.
    Closed,
    /// Bus-level failure reported by the driver.
    Bus(&'static str),
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "bulk read failed"),
            Self::WriteFailed => write!(f, "bulk write failed"),
            Self::InterruptFailed => write!(f, "interrupt read failed"),
            Self::Closed => write!(f, "port closed"),
            Self::Bus(msg) => write!(f, "bus: {msg}"),
        }
    }
}

impl std::error::Error for PortError {}

impl From<PortError> for Error {
    fn from(e: PortError) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from [`ConfigPort`](crate::app::ports::ConfigPort) operations and
/// config validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No stored config exists.
    NotFound,
    /// The backing store could not be read or written.
    Io,
    /// Stored config failed to deserialize.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Io => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
