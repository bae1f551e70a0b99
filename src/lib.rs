//! Relay/sensor controller core for the MCP23S17 thermostat board.
//!
//! Keeps an authoritative snapshot of three relay channels and their
//! sensor inputs, fed by expander interrupts and a backstop poll; mediates
//! every relay write through a throttled, one-relay-at-a-time sequence; and
//! forces all relays off if clients stop making contact.
//!
//! Transport, authentication and the register-level SPI driver live
//! outside this crate and plug in through [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod pins;
pub mod watchdog;

mod error;

pub use app::service::ThermController;
pub use app::state::{Channel, SAFE_STATE, Sensor, ThermState};
pub use error::{ConfigError, Error, PortError, Result};
