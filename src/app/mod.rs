//! Controller core — state, reconciliation, actuation.
//!
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer testable without the relay board.

pub mod actuator;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
pub mod store;
