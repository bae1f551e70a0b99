//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements   | Connects to              |
//! |----------------|--------------|--------------------------|
//! | `config_file`  | ConfigPort   | JSON file on disk        |
//! | `log_sink`     | EventSink    | `log` facade             |
//!
//! The expander port itself is implemented by the SPI driver, or by
//! [`SimExpander`](crate::drivers::sim_expander::SimExpander) on hosts.

pub mod config_file;
pub mod log_sink;
